//! DOM Events
//!
//! Synthetic events queued on the document so host observers (page
//! frameworks, tests) can see programmatic edits.

use crate::NodeId;

/// DOM event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEventType {
    /// `beforeinput`, fired before an editing command mutates content
    BeforeInput,
    /// `input`, fired after the value or editable content changed
    Input,
    /// `change`, fired when a form control's value is committed
    Change,
    /// `DOMCharacterDataModified`
    CharacterDataModified,
}

impl DomEventType {
    /// Event name as seen by scripts
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeInput => "beforeinput",
            Self::Input => "input",
            Self::Change => "change",
            Self::CharacterDataModified => "DOMCharacterDataModified",
        }
    }
}

/// DOM event
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub event_type: DomEventType,
    pub target: NodeId,
    pub prev_value: Option<String>,
    pub new_value: Option<String>,
    /// `inputType` for input events ("insertText", "insertReplacementText")
    pub input_type: Option<&'static str>,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl DomEvent {
    fn new(event_type: DomEventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            prev_value: None,
            new_value: None,
            input_type: None,
            bubbles: true,
            cancelable: false,
        }
    }

    /// `input` event
    pub fn input(target: NodeId, input_type: &'static str) -> Self {
        Self {
            input_type: Some(input_type),
            ..Self::new(DomEventType::Input, target)
        }
    }

    /// `beforeinput` event
    pub fn before_input(target: NodeId, input_type: &'static str) -> Self {
        Self {
            input_type: Some(input_type),
            cancelable: true,
            ..Self::new(DomEventType::BeforeInput, target)
        }
    }

    /// `change` event
    pub fn change(target: NodeId) -> Self {
        Self::new(DomEventType::Change, target)
    }

    /// Character data modified event
    pub fn char_data_modified(target: NodeId, old_value: &str, new_value: &str) -> Self {
        Self {
            prev_value: Some(old_value.to_string()),
            new_value: Some(new_value.to_string()),
            ..Self::new(DomEventType::CharacterDataModified, target)
        }
    }
}

/// Event dispatcher trait
pub trait EventDispatcher {
    fn dispatch_event(&mut self, event: DomEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event() {
        let event = DomEvent::input(NodeId(5), "insertText");
        assert_eq!(event.event_type, DomEventType::Input);
        assert_eq!(event.event_type.name(), "input");
        assert_eq!(event.input_type, Some("insertText"));
        assert!(event.bubbles);
    }

    #[test]
    fn test_char_data_modified_event() {
        let event = DomEvent::char_data_modified(NodeId(1), "old", "new");
        assert_eq!(event.prev_value.as_deref(), Some("old"));
        assert_eq!(event.new_value.as_deref(), Some("new"));
    }
}
