/// Highest zoom level served by common web map tile providers
pub const MAX_ZOOM_LEVEL: i32 = 22;

/// Latitude limit of the spherical web mercator projection (degrees)
pub const MAX_MERCATOR_LATITUDE: f64 = 85.0511287798066;
