use std::str::FromStr;

use thiserror::Error;

use crate::{Command, Impulse, OrderImpulse, IMPULSES_PER_TURN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("command '{value}' has {got} impulses, expected {expected}")]
    WrongLength {
        value: String,
        got: usize,
        expected: usize,
    },
    #[error("invalid impulse '{character}' at position {position} in '{value}'")]
    UnknownImpulse {
        value: String,
        character: char,
        position: usize,
    },
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let expected = IMPULSES_PER_TURN as usize;
        let letters: Vec<char> = trimmed.chars().collect();
        if letters.len() != expected {
            return Err(CommandParseError::WrongLength {
                value: trimmed.to_string(),
                got: letters.len(),
                expected,
            });
        }

        let mut impulses = [Impulse::Dig; 3];
        for (position, letter) in letters.iter().enumerate() {
            impulses[position] = match letter.to_ascii_uppercase() {
                'S' => Impulse::Step,
                'D' => Impulse::Dig,
                other => {
                    return Err(CommandParseError::UnknownImpulse {
                        value: trimmed.to_string(),
                        character: other,
                        position,
                    })
                }
            };
        }
        Ok(Command::from_impulses(impulses))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImpulseParseError {
    #[error("unknown order impulse '{character}' at position {position}")]
    UnknownImpulse { character: char, position: usize },
    #[error("teleport starting at position {position} is missing ')'")]
    UnterminatedTeleport { position: usize },
    #[error("teleport at position {position} has no pad label")]
    EmptyTeleport { position: usize },
}

/// Tokenize a written order string such as `ESE..T(A)...` into impulses.
///
/// Whitespace is ignored. A `T` must be followed by a parenthesised pad label.
pub fn parse_impulses(input: &str) -> Result<Vec<OrderImpulse>, ImpulseParseError> {
    let letters: Vec<char> = input.chars().collect();
    let mut impulses = Vec::with_capacity(letters.len());
    let mut position = 0;

    while position < letters.len() {
        let letter = letters[position];
        if letter.is_whitespace() {
            position += 1;
            continue;
        }
        if letter == 'T' {
            let (label, next) = parse_teleport(&letters, position)?;
            impulses.push(OrderImpulse::Teleport(label));
            position = next;
            continue;
        }
        let impulse = OrderImpulse::from_letter(letter).ok_or(
            ImpulseParseError::UnknownImpulse {
                character: letter,
                position,
            },
        )?;
        impulses.push(impulse);
        position += 1;
    }

    Ok(impulses)
}

fn parse_teleport(letters: &[char], start: usize) -> Result<(String, usize), ImpulseParseError> {
    if letters.get(start + 1) != Some(&'(') {
        return Err(ImpulseParseError::UnterminatedTeleport { position: start });
    }
    let close = letters[start + 2..]
        .iter()
        .position(|letter| *letter == ')')
        .map(|offset| start + 2 + offset)
        .ok_or(ImpulseParseError::UnterminatedTeleport { position: start })?;
    let label: String = letters[start + 2..close].iter().collect();
    if label.trim().is_empty() {
        return Err(ImpulseParseError::EmptyTeleport { position: start });
    }
    Ok((label.trim().to_string(), close + 1))
}
