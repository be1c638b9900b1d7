//! Car model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Car listing
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Car {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub description: String,
    /// Filenames of the stored images, in upload order
    pub images: Vec<String>,
    /// Owning user
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New car creation payload
#[derive(Debug, Clone)]
pub struct NewCar {
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub description: String,
    pub images: Vec<String>,
    pub user_id: Uuid,
}

/// Car update payload; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct CarChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    /// Replacement image list
    pub images: Option<Vec<String>>,
}

impl CarChanges {
    /// Apply the changes to an in-memory car
    pub fn apply_to(&self, car: &mut Car) {
        if let Some(name) = &self.name {
            car.name = name.clone();
        }
        if let Some(brand) = &self.brand {
            car.brand = brand.clone();
        }
        if let Some(price) = self.price {
            car.price = price;
        }
        if let Some(description) = &self.description {
            car.description = description.clone();
        }
        if let Some(images) = &self.images {
            car.images = images.clone();
        }
        car.updated_at = Utc::now();
    }
}

impl Car {
    /// Images referenced by `self` but not by `other`
    pub fn images_dropped_by(&self, other: &Car) -> Vec<String> {
        self.images
            .iter()
            .filter(|name| !other.images.contains(name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Car {
        Car {
            id: Uuid::new_v4(),
            name: "Model 3".to_string(),
            brand: "Tesla".to_string(),
            price: 35000.0,
            description: "Electric".to_string(),
            images: vec!["1-a.png".to_string(), "2-b.png".to_string()],
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serialized_shape() {
        let car = car();
        let json = serde_json::to_value(&car).unwrap();
        assert_eq!(json["_id"], car.id.to_string());
        assert_eq!(json["user"], car.user_id.to_string());
        assert_eq!(json["images"][1], "2-b.png");
        assert_eq!(json["price"], 35000.0);
    }

    #[test]
    fn test_partial_changes() {
        let mut updated = car();
        let original = updated.clone();
        CarChanges {
            price: Some(30000.0),
            images: Some(vec!["2-b.png".to_string(), "3-c.png".to_string()]),
            ..Default::default()
        }
        .apply_to(&mut updated);

        assert_eq!(updated.name, original.name);
        assert_eq!(updated.price, 30000.0);
        assert_eq!(original.images_dropped_by(&updated), vec!["1-a.png".to_string()]);
    }
}
