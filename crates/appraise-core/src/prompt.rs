use crate::context::GradingContext;
use crate::errors::{EvalError, Result};
use crate::model::{Example, Message};

const OVERVIEW_HEADING: &str = "This is the definition of a performance statement:";
const AWARD_HEADING: &str = "This is the definition of the award you are grading for:";
const TIER_HEADING: &str = "This is the award nominee's rank tier and the expectations for that tier that you should take into account when grading:";
const WING_HEADING: &str =
    "This is the Wing Commander's priorities that you should take into account when grading:";
const SQUADRON_HEADING: &str =
    "This is the Squadron Commander's priorities that you should take into account when grading:";
const RUBRIC_HEADING: &str =
    "These are the Airman Leadership Qualities that you should grade the performance statement on:";

/// The catalog-wide parts of a grading prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub persona: String,
    pub overview: String,
    pub rubric: String,
}

impl PromptTemplate {
    /// Builds the completion messages for one statement.
    ///
    /// Layout: persona (system), grading context (user), one user/assistant
    /// pair per example in order, then the statement verbatim (user).
    /// Pure and deterministic.
    pub fn build_prompt(
        &self,
        statement: &str,
        context: &GradingContext,
        examples: &[Example],
    ) -> Result<Vec<Message>> {
        if statement.trim().is_empty() {
            return Err(EvalError::config("statement is empty"));
        }
        if examples.is_empty() {
            return Err(EvalError::config(
                "few-shot example set is empty; at least one example is required",
            ));
        }

        let mut messages = Vec::with_capacity(3 + examples.len() * 2);
        messages.push(Message::system(self.persona.as_str()));
        messages.push(Message::user(self.context_block(context)));
        for ex in examples {
            messages.push(Message::user(ex.input.trim()));
            messages.push(Message::assistant(ex.output.trim()));
        }
        messages.push(Message::user(statement));
        Ok(messages)
    }

    fn context_block(&self, context: &GradingContext) -> String {
        let mut sections = vec![
            section(OVERVIEW_HEADING, &self.overview),
            section(AWARD_HEADING, &context.award.text),
        ];
        if let Some(tier) = &context.tier {
            sections.push(section(TIER_HEADING, &tier.text));
        }
        if let Some(wing) = &context.wing_priorities {
            sections.push(section(WING_HEADING, &wing.text));
        }
        if let Some(sq) = &context.squadron_priorities {
            sections.push(section(SQUADRON_HEADING, &sq.text));
        }
        sections.push(section(RUBRIC_HEADING, &self.rubric));
        sections.join("\n\n")
    }
}

fn section(heading: &str, body: &str) -> String {
    format!("{}\n{}", heading, body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Category;
    use crate::model::Role;

    fn template() -> PromptTemplate {
        PromptTemplate {
            persona: "You grade statements.".into(),
            overview: "OVERVIEW TEXT".into(),
            rubric: "RUBRIC TEXT".into(),
        }
    }

    fn full_context() -> GradingContext {
        GradingContext {
            award: Category::new("A", "AWARD TEXT"),
            tier: Some(Category::new("T", "TIER TEXT")),
            wing_priorities: Some(Category::new("W", "WING TEXT")),
            squadron_priorities: Some(Category::new("S", "SQUADRON TEXT")),
        }
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                input: "in-1".into(),
                output: "out-1\nTotal Score: 10/20".into(),
            },
            Example {
                input: "in-2".into(),
                output: "out-2\nTotal Score: 12/20".into(),
            },
        ]
    }

    #[test]
    fn test_message_layout() {
        let msgs = template()
            .build_prompt("- Did a thing.", &full_context(), &examples())
            .unwrap();
        let roles: Vec<Role> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User
            ]
        );
        assert_eq!(msgs[0].content, "You grade statements.");
        assert_eq!(msgs[2].content, "in-1");
        assert_eq!(msgs[5].content, "out-2\nTotal Score: 12/20");
        assert_eq!(msgs[6].content, "- Did a thing.");
    }

    #[test]
    fn test_context_section_order() {
        let msgs = template()
            .build_prompt("x", &full_context(), &examples())
            .unwrap();
        let block = &msgs[1].content;
        let pos = |needle: &str| block.find(needle).unwrap();
        assert!(pos("OVERVIEW TEXT") < pos("AWARD TEXT"));
        assert!(pos("AWARD TEXT") < pos("TIER TEXT"));
        assert!(pos("TIER TEXT") < pos("WING TEXT"));
        assert!(pos("WING TEXT") < pos("SQUADRON TEXT"));
        assert!(pos("SQUADRON TEXT") < pos("RUBRIC TEXT"));
    }

    #[test]
    fn test_absent_sections_are_omitted() {
        let ctx = GradingContext {
            tier: None,
            wing_priorities: None,
            squadron_priorities: None,
            ..full_context()
        };
        let msgs = template().build_prompt("x", &ctx, &examples()).unwrap();
        let block = &msgs[1].content;
        assert!(!block.contains("rank tier"));
        assert!(!block.contains("Wing Commander"));
        assert!(!block.contains("Squadron Commander"));
        assert!(!block.contains("None"));
        assert!(block.contains("AWARD TEXT"));
    }

    #[test]
    fn test_deterministic() {
        let t = template();
        let a = t.build_prompt("stmt", &full_context(), &examples()).unwrap();
        let b = t.build_prompt("stmt", &full_context(), &examples()).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_statement_kept_verbatim() {
        let stmt = "  - Led 3 teams,\n delivered 40% faster reporting.  ";
        let msgs = template()
            .build_prompt(stmt, &full_context(), &examples())
            .unwrap();
        assert_eq!(msgs.last().unwrap().content, stmt);
    }

    #[test]
    fn test_empty_statement_rejected() {
        let err = template()
            .build_prompt("   \n", &full_context(), &examples())
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_examples_rejected() {
        let err = template()
            .build_prompt("stmt", &full_context(), &[])
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfiguration(_)));
    }
}
