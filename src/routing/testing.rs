//! In-memory registration target used by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::routing::target::{Routers, Routes};

/// Records every registration, with group prefixes joined by plain concatenation.
#[derive(Debug, Default, Clone)]
pub(crate) struct Recorder {
    prefix: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl Routes<&'static str> for Recorder {
    type Handle = String;

    fn handle(&mut self, method: &str, relative_path: &str, handlers: &[&'static str]) -> String {
        let entry = format!(
            "handle {} {}{} [{}]",
            method,
            self.prefix,
            relative_path,
            handlers.join(", ")
        );
        self.log.borrow_mut().push(entry.clone());
        entry
    }
}

impl Routers<&'static str> for Recorder {
    type Group = Recorder;

    fn group(&mut self, relative_path: &str, handlers: &[&'static str]) -> Recorder {
        let prefix = format!("{}{}", self.prefix, relative_path);
        self.log
            .borrow_mut()
            .push(format!("group {} [{}]", prefix, handlers.join(", ")));
        Recorder {
            prefix,
            log: self.log.clone(),
        }
    }
}
