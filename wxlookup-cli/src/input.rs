use thiserror::Error;

/// What the operator typed at the city prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityInput {
    Empty,
    Exit,
    /// Go back to the output menu.
    Return,
    /// A normalized query, e.g. `new,york`.
    Lookup(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Value Error: city names may only contain letters, spaces or commas (found '{0}')")]
    InvalidCharacter(char),
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

pub fn parse_city_input(raw: &str) -> Result<CityInput, InputError> {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("exit") {
        return Ok(CityInput::Exit);
    }
    if trimmed.eq_ignore_ascii_case("return") {
        return Ok(CityInput::Return);
    }

    if let Some(bad) = trimmed.chars().find(|c| !(c.is_alphabetic() || *c == ' ' || *c == ',')) {
        return Err(InputError::InvalidCharacter(bad));
    }

    // "new york" -> "new,york", "London, GB" -> "London,GB"
    let query = trimmed
        .split(is_separator)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    if query.is_empty() {
        return Ok(CityInput::Empty);
    }

    Ok(CityInput::Lookup(query))
}
