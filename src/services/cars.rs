use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http::{ApiRequest, Transport, UploadForm};
use crate::models::{Car, CreateCarData, CreateCarResult, ModerationStatus, Session};
use crate::normalize::{self, normalize_car, normalize_cars, PLACEHOLDER_IMAGE};
use crate::resolve::resolve_first;
use crate::store::{keys, LocalStore};
use crate::validate;

use super::now_millis;

/// Field name aliases accepted by different upload backend versions
const UPLOAD_FIELDS: &[&str] = &["image", "file", "photo"];

/// Listing CRUD against an uncertain backend, with a local fallback so the
/// UI always has something to show.
pub struct CarService {
    transport: Arc<dyn Transport>,
    store: Arc<LocalStore>,
}

impl CarService {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<LocalStore>) -> Self {
        Self { transport, store }
    }

    /// All approved listings. Falls back to the built-in samples plus the
    /// non-expired local cache when no endpoint answers.
    pub async fn get_all_cars(&self) -> Vec<Car> {
        let candidates = [
            ApiRequest::get("/api/cars"),
            ApiRequest::get("/api/routes_cars.php?action=list"),
            ApiRequest::get("/api/router.php?route=cars&action=list"),
            ApiRequest::get("/api/cars.php?action=list"),
        ];
        if let Some(cars) = resolve_first(self.transport.as_ref(), &candidates, normalize_cars).await
        {
            return cars;
        }

        warn!("No listing endpoint reachable, serving local fallback");
        self.local_cars()
    }

    pub async fn get_car_by_id(&self, id: i64) -> Option<Car> {
        let candidates = [
            ApiRequest::get(format!("/api/cars/{id}")),
            ApiRequest::get(format!("/api/cars.php?id={id}")),
            ApiRequest::get(format!("/api/router.php?route=cars&action=get&id={id}")),
        ];
        let parse = |raw: &Value| {
            let car = normalize_car(raw);
            (car.id == id).then_some(car)
        };
        if let Some(car) = resolve_first(self.transport.as_ref(), &candidates, parse).await {
            return Some(car);
        }

        self.local_cars().into_iter().find(|car| car.id == id)
    }

    /// The caller's own listings
    pub async fn get_my_cars(&self, user_id: i64) -> Vec<Car> {
        let candidates = [
            ApiRequest::get("/api/my/cars"),
            ApiRequest::get(format!("/api/routes_cars.php?action=mine&user_id={user_id}")),
            ApiRequest::get(format!("/api/router.php?route=cars&action=mine&user_id={user_id}")),
        ];
        if let Some(cars) = resolve_first(self.transport.as_ref(), &candidates, normalize_cars).await
        {
            return cars;
        }

        self.local_cars()
            .into_iter()
            .filter(|car| car.user_id == user_id)
            .collect()
    }

    /// Create a listing, then upload its images one by one.
    ///
    /// Image uploads that fail after the listing was created are counted and
    /// reported as a soft warning on an otherwise-successful result; the
    /// listing is not rolled back. When no endpoint answers at all, a full
    /// listing is synthesized into the local cache so the UI can proceed.
    pub async fn create_car(&self, data: CreateCarData) -> Result<CreateCarResult> {
        validate::validate_car_title(&data.title)?;
        validate::validate_car_description(&data.description)?;
        validate::validate_price(data.price)?;

        let body = create_body(&data);
        let candidates = [
            ApiRequest::post("/api/cars", body.clone()),
            ApiRequest::post("/api/routes_cars.php?action=create", body.clone()),
            ApiRequest::post("/api/router.php?route=cars&action=create", body),
        ];
        let created_id =
            resolve_first(self.transport.as_ref(), &candidates, parse_created_id).await;

        match created_id {
            Some(id) => {
                let image_failures = self.upload_images(id, &data.images).await;
                if image_failures > 0 {
                    warn!("{} of {} images failed to upload for listing {}", image_failures, data.images.len(), id);
                }
                Ok(CreateCarResult { id, image_failures })
            }
            None => {
                warn!("No create endpoint reachable, storing listing locally");
                let mut car = self.synthesize_car(data);
                let existing = self.store.stored_cars(now_millis());
                // Two creates inside the same millisecond must not share an id
                while existing.iter().any(|c| c.id == car.id) {
                    car.id += 1;
                }
                let id = car.id;
                self.store.push_car(car, now_millis());
                Ok(CreateCarResult { id, image_failures: 0 })
            }
        }
    }

    /// Partial update of a listing. Backend-authoritative: not faked when
    /// every endpoint is down.
    pub async fn update_car(&self, id: i64, changes: Value) -> Result<()> {
        let candidates = [
            ApiRequest::put(format!("/api/cars/{id}"), changes.clone()),
            ApiRequest::put(format!("/api/cars.php?id={id}"), changes),
        ];
        resolve_first(self.transport.as_ref(), &candidates, accept_any)
            .await
            .ok_or(Error::Unavailable("update listing"))
    }

    pub async fn delete_car(&self, id: i64) -> Result<()> {
        let candidates = [
            ApiRequest::delete(format!("/api/cars/{id}")),
            ApiRequest::delete(format!("/api/cars.php?id={id}")),
        ];
        resolve_first(self.transport.as_ref(), &candidates, accept_any)
            .await
            .ok_or(Error::Unavailable("delete listing"))
    }

    async fn upload_images(&self, car_id: i64, images: &[crate::models::ImageUpload]) -> u32 {
        let mut failures = 0;
        for image in images {
            let mut uploaded = false;
            for field in UPLOAD_FIELDS {
                let form = UploadForm {
                    car_id,
                    field: field.to_string(),
                    filename: image.filename.clone(),
                    bytes: image.bytes.clone(),
                };
                match self.transport.upload("/api/upload", form).await {
                    Ok(_) => {
                        uploaded = true;
                        break;
                    }
                    Err(err) => {
                        debug!("Upload of {} as field '{}' failed: {}", image.filename, field, err);
                    }
                }
            }
            if !uploaded {
                failures += 1;
            }
        }
        failures
    }

    fn local_cars(&self) -> Vec<Car> {
        let mut cars = sample_cars();
        cars.extend(self.store.stored_cars(now_millis()));
        cars
    }

    fn synthesize_car(&self, data: CreateCarData) -> Car {
        let now = now_millis();
        let owner = self.store.get::<Session>(keys::SESSION);
        let (user_id, user_name, user_email) = match owner {
            Some(s) => (s.id, s.username, s.email),
            None => (1, "Usuario de Prueba".to_string(), "test@example.com".to_string()),
        };
        let images = if data.images.is_empty() {
            vec![PLACEHOLDER_IMAGE.to_string()]
        } else {
            data.images.iter().map(|_| PLACEHOLDER_IMAGE.to_string()).collect()
        };

        Car {
            id: now,
            title: data.title,
            description: data.description,
            price: data.price,
            location: data.location,
            images,
            user_id,
            user_name,
            user_email,
            status: ModerationStatus::Approved,
            created_at: Utc::now().to_rfc3339(),
            created_at_timestamp: Some(now),
            brand: data.brand.unwrap_or_else(|| "Marca Desconocida".to_string()),
            model: data.model.unwrap_or_else(|| "Modelo Desconocido".to_string()),
            year: data.year.unwrap_or_else(|| Utc::now().year()),
            mileage: data.mileage.unwrap_or(0),
            fuel_type: data.fuel_type.unwrap_or_else(|| "nafta".to_string()),
            transmission: data.transmission.unwrap_or_else(|| "manual".to_string()),
            engine: data.engine.unwrap_or_else(|| "Motor Desconocido".to_string()),
            color: data.color.unwrap_or_else(|| "Color Desconocido".to_string()),
            doors: data.doors.unwrap_or(4),
            body_type: data.body_type.unwrap_or_else(|| "Sedán".to_string()),
            features: data.features.unwrap_or_default(),
            issues: data.issues.unwrap_or_default(),
            payment_methods: data
                .payment_methods
                .unwrap_or_else(|| vec!["Efectivo".to_string()]),
            warranty: data.warranty.unwrap_or(false),
            warranty_details: data.warranty_details,
        }
    }
}

fn accept_any(_raw: &Value) -> Option<()> {
    Some(())
}

fn parse_created_id(raw: &Value) -> Option<i64> {
    let entity = normalize::unwrap_entity(raw, &["data", "car"]);
    let id = normalize::i64_field(entity, &["id", "car_id", "carId"], 0);
    (id != 0).then_some(id)
}

fn create_body(data: &CreateCarData) -> Value {
    json!({
        "title": data.title,
        "description": data.description,
        "price": data.price,
        "location": data.location,
        "brand": data.brand,
        "model": data.model,
        "year": data.year,
        "mileage": data.mileage,
        "engine": data.engine,
        "fuelType": data.fuel_type,
        "transmission": data.transmission,
        "color": data.color,
        "doors": data.doors,
        "bodyType": data.body_type,
        "features": data.features.clone().unwrap_or_default(),
        "issues": data.issues.clone().unwrap_or_default(),
        "paymentMethods": data.payment_methods.clone().unwrap_or_default(),
        "warranty": data.warranty.unwrap_or(false),
        "warrantyDetails": data.warranty_details,
    })
}

/// Built-in listings shown when nothing else is available, so a fresh
/// install against a dead backend still renders a populated marketplace.
pub fn sample_cars() -> Vec<Car> {
    info!("Serving built-in sample listings");

    vec![
        Car {
            id: 1,
            title: "Toyota Corolla 2020".to_string(),
            description: "Excelente estado, único dueño, todos los servicios al día.".to_string(),
            price: 850_000,
            location: "Salta".to_string(),
            images: vec!["/images/cars/Toyota-Corolla-2020.jpeg".to_string()],
            user_id: 1,
            user_name: "Carlos Mendoza".to_string(),
            user_email: "carlos.mendoza@email.com".to_string(),
            status: ModerationStatus::Approved,
            created_at: "2025-01-15T10:00:00Z".to_string(),
            created_at_timestamp: None,
            brand: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2020,
            mileage: 45_000,
            fuel_type: "nafta".to_string(),
            transmission: "automatico".to_string(),
            engine: "1.8L 4 cilindros".to_string(),
            color: "Blanco".to_string(),
            doors: 4,
            body_type: "Sedán".to_string(),
            features: vec![
                "Aire acondicionado".to_string(),
                "Dirección asistida".to_string(),
                "ABS".to_string(),
            ],
            issues: vec![],
            payment_methods: vec![
                "Efectivo".to_string(),
                "Transferencia".to_string(),
                "Financiación".to_string(),
            ],
            warranty: true,
            warranty_details: Some("Garantía oficial Toyota hasta 2027".to_string()),
        },
        Car {
            id: 2,
            title: "Ford Focus 2019".to_string(),
            description: "Vehículo en perfectas condiciones, muy económico.".to_string(),
            price: 720_000,
            location: "Jujuy".to_string(),
            images: vec!["/images/cars/Ford-Focus-2019.jpg".to_string()],
            user_id: 2,
            user_name: "María González".to_string(),
            user_email: "maria.gonzalez@email.com".to_string(),
            status: ModerationStatus::Approved,
            created_at: "2025-01-10T14:30:00Z".to_string(),
            created_at_timestamp: None,
            brand: "Ford".to_string(),
            model: "Focus".to_string(),
            year: 2019,
            mileage: 68_000,
            fuel_type: "nafta".to_string(),
            transmission: "manual".to_string(),
            engine: "1.6L 4 cilindros".to_string(),
            color: "Rojo".to_string(),
            doors: 4,
            body_type: "Hatchback".to_string(),
            features: vec!["Aire acondicionado".to_string(), "Bluetooth".to_string()],
            issues: vec!["Pequeño rayón en puerta trasera".to_string()],
            payment_methods: vec!["Efectivo".to_string(), "Transferencia".to_string()],
            warranty: false,
            warranty_details: None,
        },
        Car {
            id: 3,
            title: "Chevrolet Cruze 2021".to_string(),
            description: "Auto seminuevo, garantía de fábrica.".to_string(),
            price: 950_000,
            location: "Tucumán".to_string(),
            images: vec!["/images/cars/Chevrolet-Cruze-2021.webp".to_string()],
            user_id: 3,
            user_name: "Roberto Silva".to_string(),
            user_email: "roberto.silva@email.com".to_string(),
            status: ModerationStatus::Approved,
            created_at: "2025-01-20T09:15:00Z".to_string(),
            created_at_timestamp: None,
            brand: "Chevrolet".to_string(),
            model: "Cruze".to_string(),
            year: 2021,
            mileage: 25_000,
            fuel_type: "nafta".to_string(),
            transmission: "automatico".to_string(),
            engine: "1.4L Turbo".to_string(),
            color: "Negro".to_string(),
            doors: 4,
            body_type: "Sedán".to_string(),
            features: vec![
                "Cámara de retroceso".to_string(),
                "Sensores de estacionamiento".to_string(),
            ],
            issues: vec![],
            payment_methods: vec!["Efectivo".to_string(), "Tarjeta de crédito".to_string()],
            warranty: true,
            warranty_details: Some("Garantía oficial Chevrolet hasta 2028".to_string()),
        },
    ]
}
