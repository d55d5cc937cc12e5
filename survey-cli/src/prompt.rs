//! Terminal rendering of questions and parsing of typed replies.

use std::fmt::Write;

use questionnaire::{Question, QuestionKind};
use survey_service::{ImpactTally, Notification};

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Go to the previous question
    Back,
    /// Keep the current answer, if any, and move on
    Next,
    /// Record this answer and move on
    Answer(String),
}

impl Reply {
    pub fn parse(question: &Question, line: &str) -> Self {
        match line.trim() {
            "<" | "voltar" => Self::Back,
            "" => Self::Next,
            _ => Self::Answer(question.interpret(line).into_raw()),
        }
    }
}

/// Question text with its options and a progress header.
pub fn render_question(question: &Question, position: usize, total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}/{}] {}", position + 1, total, question.prompt);
    if let Some(subtitle) = &question.subtitle {
        let _ = writeln!(out, "      {}", subtitle);
    }
    match question.kind {
        QuestionKind::SingleChoice => {
            for (i, option) in question.options.iter().enumerate() {
                let _ = writeln!(out, "  {}) {}", i + 1, option);
            }
        }
        QuestionKind::Scale => {
            let _ = writeln!(out, "  {}", question.options.join(" "));
        }
        QuestionKind::FreeText => {
            let _ = writeln!(out, "  (resposta livre)");
        }
    }
    out
}

pub fn render_notification(notification: &Notification) -> String {
    format!("{}\n{}", notification.title, notification.description)
}

/// One-line counter status.
pub fn render_tally(tally: &ImpactTally) -> String {
    if tally.goal_reached {
        return format!(
            "{} respostas - Parabéns! Uma nova árvore será plantada! ({} árvores, {} kg CO₂)",
            tally.responses, tally.trees_planted, tally.co2_offset_kg
        );
    }
    format!(
        "{} respostas - {}/100, faltam {} para a próxima árvore (~{} min) - {} árvores",
        tally.responses,
        tally.progress_to_next,
        tally.remaining_to_next,
        tally.estimated_minutes,
        tally.trees_planted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use questionnaire::catalog;

    #[test]
    fn test_reply_parsing() {
        let questions = catalog::arena_brb();
        let gender = questions.get(0).unwrap();

        assert_eq!(Reply::parse(gender, "<"), Reply::Back);
        assert_eq!(Reply::parse(gender, "  "), Reply::Next);
        assert_eq!(
            Reply::parse(gender, "1"),
            Reply::Answer(gender.options[0].clone())
        );
        assert_eq!(
            Reply::parse(gender, "algo diferente"),
            Reply::Answer("algo diferente".into())
        );
    }

    #[test]
    fn test_render_choice_lists_options() {
        let questions = catalog::arena_brb();
        let rendered = render_question(questions.get(2).unwrap(), 2, questions.len());
        assert!(rendered.starts_with("[3/10]"));
        assert!(rendered.contains("3) Jogo de futebol"));
    }

    #[test]
    fn test_render_shows_subtitle() {
        let question = Question::scale(4, "Nota de 1 a 10", 1, 10).with_subtitle("10 = excelente");
        let rendered = render_question(&question, 4, 10);
        assert!(rendered.contains("      10 = excelente\n"));
        assert!(rendered.contains("1 2 3"));
    }

    #[test]
    fn test_render_tally() {
        let line = render_tally(&ImpactTally::from_responses(150));
        assert!(line.contains("50/100"));
        assert!(render_tally(&ImpactTally::from_responses(200)).contains("Parabéns"));
    }
}
