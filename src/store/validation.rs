//! Input rules applied before anything is written

use super::{CreateAuthor, CreateBook, CreateUser, StoreError, StoreResult};

pub const MIN_TITLE_LEN: usize = 5;
pub const MIN_AUTHOR_NAME_LEN: usize = 4;
pub const MIN_USERNAME_LEN: usize = 3;

fn require_len(field: &'static str, value: &str, min: usize) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(field, "is required"));
    }
    if trimmed.chars().count() < min {
        return Err(StoreError::validation(
            field,
            format!("must be at least {} characters", min),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_book(input: CreateBook) -> StoreResult<CreateBook> {
    let title = require_len("title", &input.title, MIN_TITLE_LEN)?;
    let author_name = require_len("name", &input.author_name, MIN_AUTHOR_NAME_LEN)?;

    let mut genres = Vec::with_capacity(input.genres.len());
    for genre in &input.genres {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(StoreError::validation("genres", "genres cannot be empty"));
        }
        if !genres.iter().any(|g| g == genre) {
            genres.push(genre.to_string());
        }
    }

    Ok(CreateBook {
        title,
        published: input.published,
        author_name,
        genres,
    })
}

pub fn validate_author(input: CreateAuthor) -> StoreResult<CreateAuthor> {
    Ok(CreateAuthor {
        name: require_len("name", &input.name, MIN_AUTHOR_NAME_LEN)?,
        born: input.born,
    })
}

pub fn validate_user(input: CreateUser) -> StoreResult<CreateUser> {
    let username = require_len("username", &input.username, MIN_USERNAME_LEN)?;
    let favorite_genre = input.favorite_genre.trim();
    if favorite_genre.is_empty() {
        return Err(StoreError::validation("favoriteGenre", "is required"));
    }
    Ok(CreateUser {
        username,
        favorite_genre: favorite_genre.to_string(),
    })
}
