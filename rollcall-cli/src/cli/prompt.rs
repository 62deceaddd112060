//! Interactive prompts
//!
//! Every prompt returns an [`Outcome`]: the operator either confirms a
//! value or backs out, and callers branch on that instead of callbacks.

use std::fmt::Display;

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

use crate::session::NewStudent;

/// Result of a modal interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Confirmed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn confirmed(self) -> Option<T> {
        match self {
            Outcome::Confirmed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Outcome::Confirmed(value),
            None => Outcome::Cancelled,
        }
    }
}

/// Yes/no question; "no" and Escape both cancel
pub fn confirm(prompt: &str, default: bool) -> Result<Outcome<()>> {
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact_opt()?;
    Ok(match answer {
        Some(true) => Outcome::Confirmed(()),
        _ => Outcome::Cancelled,
    })
}

/// Pick one option from a list; Escape cancels
pub fn choose<T: Clone + Display>(prompt: &str, options: &[T]) -> Result<Outcome<T>> {
    let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let picked = select(prompt, &labels)?.confirmed();
    Ok(picked.map(|i| options[i].clone()).into())
}

/// Pick a line by position; Escape cancels
pub fn select(prompt: &str, labels: &[String]) -> Result<Outcome<usize>> {
    if labels.is_empty() {
        return Ok(Outcome::Cancelled);
    }
    let picked = Select::new()
        .with_prompt(prompt)
        .items(labels)
        .default(0)
        .interact_opt()?;
    Ok(picked.into())
}

/// Free text; an empty answer cancels
pub fn text(prompt: &str) -> Result<Outcome<String>> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim().to_string();
    Ok(if value.is_empty() {
        Outcome::Cancelled
    } else {
        Outcome::Confirmed(value)
    })
}

/// Optional free text; an empty answer is an empty string
pub fn optional_text(prompt: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Details for a student added by hand, with optional notes
///
/// Leaving any required field blank cancels the whole form.
pub fn new_student(card_id: Option<&str>) -> Result<Outcome<(NewStudent, String)>> {
    if let Some(card) = card_id {
        println!("Adding student for card {}", card);
    }

    let Outcome::Confirmed(student_id) = text("Student ID")? else {
        return Ok(Outcome::Cancelled);
    };
    let Outcome::Confirmed(name) = text("Name")? else {
        return Ok(Outcome::Cancelled);
    };
    let Outcome::Confirmed(phone) = text("Phone")? else {
        return Ok(Outcome::Cancelled);
    };
    let notes = optional_text("Notes (blank for 'manual addition')")?;

    Ok(Outcome::Confirmed((
        NewStudent {
            student_id,
            name,
            phone,
        },
        notes,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_option() {
        assert_eq!(Outcome::from(Some(3)), Outcome::Confirmed(3));
        assert_eq!(Outcome::<u8>::from(None), Outcome::Cancelled);
        assert_eq!(Outcome::Confirmed("a").confirmed(), Some("a"));
        assert!(!Outcome::<()>::Cancelled.is_confirmed());
    }
}
