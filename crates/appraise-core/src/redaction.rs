use crate::model::{Message, Role};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, Default)]
pub struct RedactionPolicy {
    pub redact_prompts: bool,
}

impl RedactionPolicy {
    pub fn new(redact_prompts: bool) -> Self {
        Self { redact_prompts }
    }

    pub fn redact_prompt<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if self.redact_prompts {
            "[REDACTED]".into()
        } else {
            s.into()
        }
    }

    /// Copy of `messages` safe for logging: the trailing user block (the
    /// statement under evaluation) is redacted when the policy says so.
    pub fn redact_messages<'a>(&self, messages: &'a [Message]) -> Cow<'a, [Message]> {
        if !self.redact_prompts {
            return Cow::Borrowed(messages);
        }
        let mut owned = messages.to_vec();
        if let Some(last) = owned.last_mut() {
            if last.role == Role::User {
                last.content = "[REDACTED]".to_string();
            }
        }
        Cow::Owned(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction_on() {
        let policy = RedactionPolicy::new(true);
        assert_eq!(policy.redact_prompt("my secret statement"), "[REDACTED]");
    }

    #[test]
    fn test_redaction_off() {
        let policy = RedactionPolicy::new(false);
        assert_eq!(policy.redact_prompt("safe statement"), "safe statement");
    }

    #[test]
    fn test_redact_messages_only_touches_statement() {
        let msgs = vec![Message::system("persona"), Message::user("- Led 3 teams.")];
        let redacted = RedactionPolicy::new(true).redact_messages(&msgs);
        assert_eq!(redacted[0].content, "persona");
        assert_eq!(redacted[1].content, "[REDACTED]");
        assert_eq!(msgs[1].content, "- Led 3 teams.");
    }
}
