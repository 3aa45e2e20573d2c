//! Cálculo de distancias geográficas
//!
//! Fórmula de Haversine sobre la esfera terrestre (R = 6371 km).

/// Radio de la Tierra en kilómetros
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calcula la distancia de círculo máximo entre dos puntos GPS en kilómetros.
///
/// Puntos idénticos devuelven exactamente 0.0. El término interno se acota a
/// [0, 1] para que el error de redondeo en coma flotante nunca saque a la
/// raíz cuadrada de su dominio.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distancia_de_punto_a_si_mismo_es_cero() {
        let points = [
            (0.0, 0.0),
            (4.60971, -74.08175),
            (90.0, 180.0),
            (-90.0, -180.0),
            (48.8566, 2.3522),
        ];
        for (lat, lon) in points {
            let d = distance_km(lat, lon, lat, lon);
            assert_eq!(d, 0.0, "distancia no nula para ({}, {})", lat, lon);
            assert!(!d.is_nan());
        }
    }

    #[test]
    fn distancia_es_simetrica() {
        let d1 = distance_km(4.60971, -74.08175, 48.8566, 2.3522);
        let d2 = distance_km(48.8566, 2.3522, 4.60971, -74.08175);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn distancia_conocida_en_bogota() {
        // Dos puntos a pocas cuadras en Bogotá: ~0.037 km
        let d = distance_km(4.60971, -74.08175, 4.61000, -74.08200);
        assert!((d - 0.037).abs() < 0.01, "distancia inesperada: {}", d);
    }

    #[test]
    fn distancia_nunca_negativa_ni_nan_en_antipodas() {
        // Antípodas exactas: el término haversine roza 1.0
        let d = distance_km(45.0, 0.0, -45.0, 180.0);
        assert!(d > 0.0);
        assert!(!d.is_nan());
        // Media circunferencia terrestre ≈ 20015 km
        assert!((d - 20015.0).abs() < 10.0);
    }
}
