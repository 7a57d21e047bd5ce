//! Line-at-a-time interview that records who a deck is for and what it
//! should achieve.

use crate::artifacts;
use chrono::{DateTime, Utc};
use keynote_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    /// Example answers, or a skip hint for optional questions.
    pub hint: &'static str,
    pub follow_up: Option<&'static str>,
}

pub const REQUIRED_QUESTIONS: [Question; 5] = [
    Question {
        id: "audience",
        prompt: "Who is the audience for this presentation?",
        hint: "e.g., executives, technical team, investors, customers, board members",
        follow_up: Some("What do they care most about?"),
    },
    Question {
        id: "goal",
        prompt: "What should the audience DO after seeing this?",
        hint: "e.g., approve budget, sign contract, understand strategy, get excited",
        follow_up: None,
    },
    Question {
        id: "delivery",
        prompt: "How will this be delivered?",
        hint: "e.g., live keynote, meeting presentation, async/email, pitch competition",
        follow_up: None,
    },
    Question {
        id: "duration",
        prompt: "How long is the presentation?",
        hint: "e.g., 5 minutes, 15 minutes, 30 minutes, self-paced reading",
        follow_up: None,
    },
    Question {
        id: "stakes",
        prompt: "What are the stakes?",
        hint: "e.g., informational update, important decision, critical deal, career-defining",
        follow_up: None,
    },
];

pub const OPTIONAL_QUESTIONS: [Question; 4] = [
    Question {
        id: "objections",
        prompt: "What pushback or objections do you expect?",
        hint: "Press Enter to skip",
        follow_up: None,
    },
    Question {
        id: "competition",
        prompt: "What alternatives is the audience considering?",
        hint: "Press Enter to skip",
        follow_up: None,
    },
    Question {
        id: "priorKnowledge",
        prompt: "What does the audience already know about this topic?",
        hint: "Press Enter to skip",
        follow_up: None,
    },
    Question {
        id: "constraints",
        prompt: "What CAN'T you say? (legal, confidential, premature)",
        hint: "Press Enter to skip",
        follow_up: None,
    },
];

/// Answers from the review interview, persisted as `review-context.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterviewContext {
    pub deck_path: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub audience: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audience_follow_up: String,
    pub goal: String,
    /// Older context files stored this answer under `context`.
    #[serde(alias = "context")]
    pub delivery: String,
    pub duration: String,
    pub stakes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objections: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_knowledge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
}

impl InterviewContext {
    pub fn new(deck_path: &Path) -> Self {
        Self {
            deck_path: deck_path.display().to_string(),
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Record an answer by question id. Unknown ids are ignored.
    pub fn set(&mut self, id: &str, answer: String) {
        match id {
            "audience" => self.audience = answer,
            "audienceFollowUp" => self.audience_follow_up = answer,
            "goal" => self.goal = answer,
            "delivery" => self.delivery = answer,
            "duration" => self.duration = answer,
            "stakes" => self.stakes = answer,
            "objections" => self.objections = Some(answer),
            "competition" => self.competition = Some(answer),
            "priorKnowledge" => self.prior_knowledge = Some(answer),
            "constraints" => self.constraints = Some(answer),
            other => log::debug!("Ignoring answer for unknown question {}", other),
        }
    }
}

pub fn context_path(deck_dir: &Path) -> PathBuf {
    artifacts::material(deck_dir, artifacts::REVIEW_CONTEXT)
}

pub fn load_context(deck_dir: &Path) -> Result<Option<InterviewContext>> {
    artifacts::read_json_if_exists(&context_path(deck_dir))
}

/// Load an earlier interview, failing when none was recorded.
pub fn require_context(deck_dir: &Path) -> Result<InterviewContext> {
    load_context(deck_dir)?.ok_or_else(|| Error::MissingContext(context_path(deck_dir)))
}

pub fn save_context(deck_dir: &Path, context: &InterviewContext) -> Result<PathBuf> {
    let path = context_path(deck_dir);
    artifacts::write_json(&path, context)?;
    Ok(path)
}

/// Reads one line per answer from `input`, writing prompts to `output`.
pub struct Interviewer<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interviewer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask and return the trimmed answer. End of input is an error.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(Error::IoError(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "input ended before the interview finished",
            )));
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Run the review interview. Empty optional answers are left out.
    pub fn conduct(&mut self, deck_path: &Path) -> Result<InterviewContext> {
        self.say("\nDECK REVIEW: Interview Phase\n")?;
        self.say("I need to understand your deck before reviewing it.")?;

        let mut context = InterviewContext::new(deck_path);

        for question in &REQUIRED_QUESTIONS {
            self.say(&format!("\n{}\n   ({})", question.prompt, question.hint))?;
            let answer = self.ask("-> ")?;
            let answered = !answer.is_empty();
            context.set(question.id, answer);

            if let (Some(follow_up), true) = (question.follow_up, answered) {
                self.say(&format!("   {}", follow_up))?;
                let detail = self.ask("-> ")?;
                context.set(&format!("{}FollowUp", question.id), detail);
            }
        }

        self.say("\n--- Optional (helps with deeper review) ---")?;
        for question in &OPTIONAL_QUESTIONS {
            self.say(&format!("\n{}\n   ({})", question.prompt, question.hint))?;
            let answer = self.ask("-> ")?;
            if !answer.is_empty() {
                context.set(question.id, answer);
            }
        }

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_conduct_records_answers() {
        let answers = "board members\nrunway\napprove budget\nlive keynote\n15 minutes\ncritical deal\n\nthe status quo\nlittle\n\n";
        let mut output = Vec::new();
        let context = Interviewer::new(Cursor::new(answers), &mut output)
            .conduct(Path::new("decks/demo"))
            .unwrap();

        assert_eq!(context.deck_path, "decks/demo");
        assert_eq!(context.audience, "board members");
        assert_eq!(context.audience_follow_up, "runway");
        assert_eq!(context.goal, "approve budget");
        assert_eq!(context.delivery, "live keynote");
        assert_eq!(context.stakes, "critical deal");
        assert_eq!(context.objections, None);
        assert_eq!(context.competition.as_deref(), Some("the status quo"));
        assert_eq!(context.prior_knowledge.as_deref(), Some("little"));
        assert_eq!(context.constraints, None);

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.contains("What do they care most about?"));
    }

    #[test]
    fn test_empty_audience_skips_follow_up() {
        let answers = "\napprove budget\nlive keynote\n15 minutes\nlow\n\n\n\n\n";
        let context = Interviewer::new(Cursor::new(answers), Vec::new())
            .conduct(Path::new("decks/demo"))
            .unwrap();
        assert_eq!(context.audience, "");
        assert_eq!(context.audience_follow_up, "");
        assert_eq!(context.goal, "approve budget");
    }

    #[test]
    fn test_truncated_input_is_error() {
        let err = Interviewer::new(Cursor::new("board\n"), Vec::new())
            .conduct(Path::new("decks/demo"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_legacy_context_key() {
        let json = r#"{ "deckPath": "decks/demo", "audience": "investors", "context": "pitch competition" }"#;
        let context: InterviewContext = serde_json::from_str(json).unwrap();
        assert_eq!(context.delivery, "pitch competition");
        assert_eq!(context.goal, "");
    }

    #[test]
    fn test_require_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = require_context(dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingContext(_)));

        let mut context = InterviewContext::new(dir.path());
        context.set("audience", "engineers".to_string());
        save_context(dir.path(), &context).unwrap();

        let loaded = require_context(dir.path()).unwrap();
        assert_eq!(loaded, context);
    }
}
