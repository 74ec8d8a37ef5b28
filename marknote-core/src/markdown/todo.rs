//! Task-list markers as note-service todo elements.
//!
//! The service renders `<en-todo/>` checkboxes natively; HTML input
//! elements would be rejected by its markup validation.

use pulldown_cmark::Event;

use super::owned;

pub struct TodoTransformer;

impl TodoTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        events
            .into_iter()
            .map(|event| match event {
                Event::TaskListMarker(checked) => {
                    let element = if checked {
                        r#"<en-todo checked="true"/>"#
                    } else {
                        "<en-todo/>"
                    };
                    Event::InlineHtml(owned(element))
                }
                other => other,
            })
            .collect()
    }
}

impl Default for TodoTransformer {
    fn default() -> Self {
        Self::new()
    }
}
