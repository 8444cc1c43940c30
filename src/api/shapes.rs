//! Wire representations.
//!
//! Each context gets its own shape, and the per-action selection for wine
//! endpoints is a plain lookup (`shape_for`) rather than anything dynamic.
//! Password hashes never appear in any shape.

use serde_json::{json, Value};

use crate::database::models::review::ReviewRow;
use crate::database::models::user::UserRow;
use crate::database::models::wine::{WineDetailRow, WineListRow, WineRow};

/// Wine endpoint actions that render a wine payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WineAction {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    UploadImage,
    AddReview,
}

/// Response shapes for wine payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WineShape {
    /// Compact list item: id, title, vintage, price, image, average_rating
    List,
    /// Full record plus average_rating and embedded reviews
    Detail,
    /// Full record as written (create/update responses)
    Record,
    /// id + image only
    Image,
    /// The created review
    Review,
}

/// The {action} -> {shape} mapping, one lookup per request
pub fn shape_for(action: WineAction) -> WineShape {
    match action {
        WineAction::List => WineShape::List,
        WineAction::Retrieve => WineShape::Detail,
        WineAction::Create | WineAction::Update | WineAction::PartialUpdate => WineShape::Record,
        WineAction::UploadImage => WineShape::Image,
        WineAction::AddReview => WineShape::Review,
    }
}

pub fn wine_list_item(row: &WineListRow) -> Value {
    json!({
        "id": row.id,
        "title": row.title,
        "vintage": row.vintage,
        "price": row.price,
        "image": row.image,
        "average_rating": row.average_rating,
    })
}

pub fn wine_record(wine: &WineRow) -> Value {
    json!({
        "id": wine.id,
        "title": wine.title,
        "description": wine.description,
        "price": wine.price,
        "wine_type": wine.wine_type,
        "abv": wine.abv,
        "vintage": wine.vintage,
        "country": wine.country,
        "region": wine.region,
        "grape": wine.grape,
        "characteristics": wine.characteristics,
        "style": wine.style,
        "capacity": wine.capacity,
        "image": wine.image,
    })
}

pub fn wine_detail(detail: &WineDetailRow, reviews: &[ReviewRow]) -> Value {
    let mut value = wine_record(&detail.wine);
    value["average_rating"] = json!(detail.average_rating);
    value["reviews"] = Value::Array(reviews.iter().map(review).collect());
    value
}

pub fn wine_image(wine: &WineRow) -> Value {
    json!({
        "id": wine.id,
        "image": wine.image,
    })
}

pub fn review(row: &ReviewRow) -> Value {
    json!({
        "id": row.id,
        "wine": row.wine_id,
        "user": row.user_id,
        "rating": row.rating,
        "comment": row.comment,
        "created_at": row.created_at,
    })
}

/// Registration/account shape; role flag is informational, never writable
pub fn user(row: &UserRow) -> Value {
    json!({
        "id": row.id,
        "email": row.email,
        "is_staff": row.is_staff,
    })
}

/// Profile shape with the favorites set embedded as list items
pub fn user_detail(row: &UserRow, saved_wines: &[WineListRow]) -> Value {
    json!({
        "id": row.id,
        "email": row.email,
        "first_name": row.first_name,
        "last_name": row.last_name,
        "saved_wines": saved_wines.iter().map(wine_list_item).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_user() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "taster@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Vintner".to_string(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn action_to_shape_lookup() {
        assert_eq!(shape_for(WineAction::List), WineShape::List);
        assert_eq!(shape_for(WineAction::Retrieve), WineShape::Detail);
        assert_eq!(shape_for(WineAction::Create), WineShape::Record);
        assert_eq!(shape_for(WineAction::Update), WineShape::Record);
        assert_eq!(shape_for(WineAction::PartialUpdate), WineShape::Record);
        assert_eq!(shape_for(WineAction::UploadImage), WineShape::Image);
        assert_eq!(shape_for(WineAction::AddReview), WineShape::Review);
    }

    #[test]
    fn user_shapes_never_expose_password() {
        let row = sample_user();
        for value in [user(&row), user_detail(&row, &[])] {
            let text = value.to_string();
            assert!(!text.contains("password"), "leaked password in {}", text);
            assert!(!text.contains("argon2"), "leaked hash in {}", text);
        }
    }

    #[test]
    fn detail_embeds_average_and_reviews() {
        let wine = WineRow {
            id: Uuid::new_v4(),
            title: "Test Wine".to_string(),
            description: String::new(),
            price: Some(15.99),
            wine_type: "Red".to_string(),
            abv: None,
            vintage: "2020".to_string(),
            country: "France".to_string(),
            region: String::new(),
            grape: String::new(),
            characteristics: String::new(),
            style: String::new(),
            capacity: Some(0.75),
            image: None,
            created_at: Utc::now(),
        };
        let review_row = ReviewRow {
            id: Uuid::new_v4(),
            wine_id: wine.id,
            user_id: Uuid::new_v4(),
            rating: 4,
            comment: "Wow".to_string(),
            created_at: Utc::now(),
        };
        let detail = WineDetailRow {
            wine,
            average_rating: Some(4.0),
        };

        let value = wine_detail(&detail, std::slice::from_ref(&review_row));
        assert_eq!(value["average_rating"], 4.0);
        assert_eq!(value["reviews"][0]["rating"], 4);
        assert_eq!(value["reviews"][0]["comment"], "Wow");
    }
}
