// src/location_tests.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::location::{
        coordinate_label, FixOptions, FixedLocationSource, GeoFix, LocationError,
        LocationProvider, LocationSource, ReverseGeocoder, UnsupportedLocationSource,
    };

    struct DeniedSource;

    #[async_trait]
    impl LocationSource for DeniedSource {
        async fn current_fix(&self, _options: FixOptions) -> Result<GeoFix, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    /// Never produces a fix inside any sane deadline.
    struct StalledSource;

    #[async_trait]
    impl LocationSource for StalledSource {
        async fn current_fix(&self, _options: FixOptions) -> Result<GeoFix, LocationError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(GeoFix {
                latitude: 0.0,
                longitude: 0.0,
                accuracy_m: 0.0,
            })
        }
    }

    #[tokio::test]
    async fn capture_without_a_geocoder_formats_coordinates() {
        let provider = LocationProvider::new(
            Arc::new(FixedLocationSource::new(59.3346, 18.0632, 12.0)),
            None,
        );

        let reading = provider.capture().await.unwrap();
        assert_eq!(reading.latitude, 59.3346);
        assert_eq!(reading.longitude, 18.0632);
        assert_eq!(reading.accuracy_m, 12.0);
        assert_eq!(reading.address, "59.334600, 18.063200");
    }

    #[tokio::test]
    async fn a_geocoding_outage_never_fails_the_capture() {
        // A geocoder that cannot even build a request degrades to the
        // coordinate string, same as a network failure would.
        let geocoder = ReverseGeocoder::new("not a real endpoint", "key-123", 1);
        let provider = LocationProvider::new(
            Arc::new(FixedLocationSource::new(-33.9249, 18.4241, 40.0)),
            Some(geocoder),
        );

        let reading = provider.capture().await.unwrap();
        assert!(!reading.address.is_empty());
        assert_eq!(reading.address, "-33.924900, 18.424100");
    }

    #[tokio::test]
    async fn an_unsupported_platform_is_reported_as_such() {
        let provider = LocationProvider::new(Arc::new(UnsupportedLocationSource), None);
        assert_eq!(
            provider.capture().await.unwrap_err(),
            LocationError::Unsupported
        );
    }

    #[tokio::test]
    async fn a_permission_denial_is_passed_through() {
        let provider = LocationProvider::new(Arc::new(DeniedSource), None);
        assert_eq!(
            provider.capture().await.unwrap_err(),
            LocationError::PermissionDenied
        );
    }

    #[tokio::test]
    async fn a_stalled_source_hits_the_capture_timeout() {
        let provider = LocationProvider::new(Arc::new(StalledSource), None)
            .with_timeout(Duration::from_millis(20));
        assert_eq!(provider.capture().await.unwrap_err(), LocationError::Timeout);
    }

    #[test]
    fn coordinate_labels_use_six_decimals() {
        let label = coordinate_label(&GeoFix {
            latitude: -33.9249,
            longitude: 18.4241,
            accuracy_m: 5.0,
        });
        assert_eq!(label, "-33.924900, 18.424100");
    }
}
