use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::geo::{Coordinates, GeoError, Geofence};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OfficeLocation {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl OfficeLocation {
    pub fn geofence(&self) -> Result<Geofence, GeoError> {
        Geofence::new(Coordinates::new(self.latitude, self.longitude)?, self.radius_m)
    }
}
