//! Staff application questionnaires.
//!
//! The interview itself happens over DM in the command layer; this module
//! owns the positions, their question lists, and the answer bookkeeping.

/// Discord embed field value limit, which caps answer length.
const MAX_ANSWER_LEN: usize = 1024;

const HELPER_QUESTIONS: &[&str] = &[
    "How old are you?",
    "What timezone are you in, and when are you usually online?",
    "How long have you been a member of the server?",
    "Do you have any previous moderation experience? If so, where and for how long?",
    "A member is repeatedly skirting the rules without clearly breaking them. What do you do?",
    "Why do you want to become a Helper?",
];

const HOSPITALITY_QUESTIONS: &[&str] = &[
    "How old are you?",
    "What timezone are you in, and when are you usually online?",
    "How would you welcome a new member who seems lost?",
    "What community events would you like to help run?",
    "Why do you want to join the Hospitality Team?",
];

/// An applyable position. Developer applications are handled out of band
/// and never reach a questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Helper,
    Hospitality,
}

impl Position {
    pub fn name(&self) -> &'static str {
        match self {
            Position::Helper => "Helper",
            Position::Hospitality => "Hospitality Team",
        }
    }

    pub fn questions(&self) -> &'static [&'static str] {
        match self {
            Position::Helper => HELPER_QUESTIONS,
            Position::Hospitality => HOSPITALITY_QUESTIONS,
        }
    }
}

/// Why an answer was not accepted. The question is asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerError {
    Empty,
    TooLong,
}

impl AnswerError {
    pub fn message(&self) -> &'static str {
        match self {
            AnswerError::Empty => "Sorry, that doesn't seem like a valid answer. Please try again.",
            AnswerError::TooLong => {
                "Sorry, that answer is too long. Please keep it under 1024 characters."
            }
        }
    }
}

/// One in-flight application. Questions are answered strictly in order;
/// `next_question` returns `None` once every answer is in.
pub struct Application {
    position: Position,
    answers: Vec<String>,
}

impl Application {
    pub fn new(position: Position) -> Self {
        Self { position, answers: Vec::new() }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// The next unanswered question, numbered from 1.
    pub fn next_question(&self) -> Option<(usize, &'static str)> {
        self.position
            .questions()
            .get(self.answers.len())
            .map(|q| (self.answers.len() + 1, *q))
    }

    pub fn submit_answer(&mut self, text: &str) -> Result<(), AnswerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnswerError::Empty);
        }
        if text.len() > MAX_ANSWER_LEN {
            return Err(AnswerError::TooLong);
        }
        self.answers.push(text.to_string());
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.position.questions().len()
    }

    /// Question and answer pairs, in the order they were asked.
    pub fn transcript(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.position
            .questions()
            .iter()
            .zip(self.answers.iter())
            .map(|(q, a)| (*q, a.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_come_in_order() {
        let mut app = Application::new(Position::Hospitality);
        let total = Position::Hospitality.questions().len();

        for expected in 1..=total {
            let (number, question) = app.next_question().unwrap();
            assert_eq!(number, expected);
            assert_eq!(question, Position::Hospitality.questions()[expected - 1]);
            app.submit_answer(&format!("answer {}", expected)).unwrap();
        }

        assert!(app.is_complete());
        assert!(app.next_question().is_none());
    }

    #[test]
    fn test_bad_answers_do_not_advance() {
        let mut app = Application::new(Position::Helper);

        assert_eq!(app.submit_answer("   "), Err(AnswerError::Empty));
        assert_eq!(app.submit_answer(&"x".repeat(2000)), Err(AnswerError::TooLong));
        assert_eq!(app.next_question().map(|(n, _)| n), Some(1));

        app.submit_answer("eighteen").unwrap();
        assert_eq!(app.next_question().map(|(n, _)| n), Some(2));
    }

    #[test]
    fn test_transcript_pairs_questions_with_answers() {
        let mut app = Application::new(Position::Hospitality);
        app.submit_answer("twenty").unwrap();
        app.submit_answer("UTC, evenings").unwrap();

        let pairs: Vec<_> = app.transcript().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], (Position::Hospitality.questions()[0], "twenty"));
        assert_eq!(pairs[1].1, "UTC, evenings");
    }
}
