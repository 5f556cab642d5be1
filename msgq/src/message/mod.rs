use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageTag {
    None,
    Some,
    Quit,
}

impl MessageTag {
    pub fn code(&self) -> i32 {
        match self {
            MessageTag::None => 0,
            MessageTag::Some => 1,
            MessageTag::Quit => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<MessageTag> {
        match code {
            0 => Some(MessageTag::None),
            1 => Some(MessageTag::Some),
            2 => Some(MessageTag::Quit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageTag::None => "NONE",
            MessageTag::Some => "SOME",
            MessageTag::Quit => "QUIT",
        }
    }
}

impl Default for MessageTag {
    fn default() -> Self {
        MessageTag::None
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the name of a raw tag code, or `None` if the code is out of range.
pub fn tag_name(code: i32) -> Option<&'static str> {
    MessageTag::from_code(code).map(|t| t.name())
}

/// A fixed-size record passed through a `MessageQueue`.
///
/// `value` only carries data for `MessageTag::Some`. The queue itself never
/// looks at either field.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    pub tag: MessageTag,
    pub value: isize,
}

impl Message {
    pub fn new(tag: MessageTag, value: isize) -> Message {
        Message { tag, value }
    }

    #[inline]
    pub fn some(value: isize) -> Message {
        Message::new(MessageTag::Some, value)
    }

    #[inline]
    pub fn quit() -> Message {
        Message::new(MessageTag::Quit, 0)
    }

    #[inline]
    pub fn none() -> Message {
        Message::default()
    }

    pub fn is_quit(&self) -> bool {
        self.tag == MessageTag::Quit
    }

    pub fn payload(&self) -> Option<isize> {
        match self.tag {
            MessageTag::Some => Some(self.value),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.tag, self.value)
    }
}
