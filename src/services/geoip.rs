/// Country lookup boundary for signup click tracking. Production plugs a
/// real geo-IP database in; the portal only needs the trait.
pub trait GeoIpResolver: Send + Sync {
    fn lookup_country(&self, ip: &str) -> Option<String>;
}

/// Resolver used when no geo-IP database is configured.
pub struct NoopGeoIp;

impl GeoIpResolver for NoopGeoIp {
    fn lookup_country(&self, _ip: &str) -> Option<String> {
        None
    }
}
