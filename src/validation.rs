//! Request validation. Each validator collects every violated rule before
//! failing so the caller sees the complete list in one response.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::AppError,
    models::{
        ArticleChanges, ArticleStatus, CreateArticleRequest, FeedFilter, FeedQuery, LoginRequest,
        NewArticle, Role, SignupRequest, UpdateArticleRequest,
    },
};

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z]+( [A-Za-z]+)*$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 50;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Signup fields after normalization. The password is still plaintext here.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn finish<T>(errors: Vec<String>, value: impl FnOnce() -> T) -> Result<T, AppError> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn check_name(name: &str, errors: &mut Vec<String>) {
    if name.is_empty() {
        errors.push("name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(format!("name must be at most {MAX_NAME_LEN} characters"));
    } else if !NAME_RE.is_match(name) {
        errors.push("name must contain only letters separated by single spaces".to_string());
    }
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    if email.is_empty() {
        errors.push("email is required".to_string());
    } else if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        errors.push("email must be a valid email address".to_string());
    }
}

/// Strength rules for new passwords.
pub fn password_violations(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        errors.push(format!("password must be at most {MAX_PASSWORD_BYTES} bytes"));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push("password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push("password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("password must contain at least one digit".to_string());
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        errors.push("password must contain at least one special character".to_string());
    }
    errors
}

pub fn validate_signup(req: &SignupRequest) -> Result<ValidSignup, AppError> {
    let mut errors = Vec::new();

    let name = req.name.trim().to_string();
    check_name(&name, &mut errors);

    let email = normalize_email(&req.email);
    check_email(&email, &mut errors);

    errors.extend(password_violations(&req.password));

    let role = Role::parse(&req.role);
    if role.is_none() {
        errors.push("role must be one of: author, reader".to_string());
    }

    match role {
        Some(role) if errors.is_empty() => Ok(ValidSignup {
            name,
            email,
            password: req.password.clone(),
            role,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Returns the normalized email. Strength rules are not applied to login
/// passwords; a wrong password is a credentials failure, not a validation one.
pub fn validate_login(req: &LoginRequest) -> Result<String, AppError> {
    let mut errors = Vec::new();
    let email = normalize_email(&req.email);
    check_email(&email, &mut errors);
    if req.password.is_empty() {
        errors.push("password is required".to_string());
    }
    finish(errors, || email)
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    if title.is_empty() {
        errors.push("title is required".to_string());
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.push(format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
}

fn check_content(content: &str, errors: &mut Vec<String>) {
    if content.trim().is_empty() {
        errors.push("content is required".to_string());
    }
}

fn check_category(category: &str, errors: &mut Vec<String>) {
    if category.is_empty() {
        errors.push("category is required".to_string());
    } else if category.chars().count() > MAX_CATEGORY_LEN {
        errors.push(format!(
            "category must be at most {MAX_CATEGORY_LEN} characters"
        ));
    }
}

fn check_status(raw: &str, errors: &mut Vec<String>) -> Option<ArticleStatus> {
    let status = ArticleStatus::parse(raw);
    if status.is_none() {
        errors.push("status must be one of: draft, published".to_string());
    }
    status
}

pub fn validate_new_article(req: &CreateArticleRequest) -> Result<NewArticle, AppError> {
    let mut errors = Vec::new();

    let title = req.title.trim().to_string();
    check_title(&title, &mut errors);
    check_content(&req.content, &mut errors);
    let category = req.category.trim().to_string();
    check_category(&category, &mut errors);

    let status = match req.status.as_deref() {
        Some(raw) => check_status(raw, &mut errors).unwrap_or_default(),
        None => ArticleStatus::Draft,
    };

    finish(errors, || NewArticle {
        title,
        content: req.content.clone(),
        category,
        status,
    })
}

pub fn validate_article_changes(req: &UpdateArticleRequest) -> Result<ArticleChanges, AppError> {
    let mut errors = Vec::new();

    if req.title.is_none() && req.content.is_none() && req.category.is_none() && req.status.is_none()
    {
        errors.push("at least one of title, content, category, status must be provided".to_string());
    }

    let title = req.title.as_deref().map(|t| t.trim().to_string());
    if let Some(title) = &title {
        check_title(title, &mut errors);
    }
    if let Some(content) = &req.content {
        check_content(content, &mut errors);
    }
    let category = req.category.as_deref().map(|c| c.trim().to_string());
    if let Some(category) = &category {
        check_category(category, &mut errors);
    }
    let status = req
        .status
        .as_deref()
        .and_then(|raw| check_status(raw, &mut errors));

    finish(errors, || ArticleChanges {
        title,
        content: req.content.clone(),
        category,
        status,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Splits the raw feed query into normalized filters and page coordinates,
/// applying the defaults. Range checks happen in [`validate_page`].
pub fn feed_params(query: &FeedQuery) -> (FeedFilter, i64, i64) {
    let filter = FeedFilter {
        category: non_blank(&query.category),
        author: non_blank(&query.author),
        q: non_blank(&query.q),
    };
    (
        filter,
        query.page.unwrap_or(DEFAULT_PAGE),
        query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    )
}

pub fn validate_page(page: i64, size: i64) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if page < 1 {
        errors.push("page must be greater than or equal to 1".to_string());
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        errors.push(format!("size must be between 1 and {MAX_PAGE_SIZE}"));
    }
    finish(errors, || ())
}
