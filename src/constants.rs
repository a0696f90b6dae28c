// Endpoints and request constants for the external lookups.
// These are the defaults; `config.toml` may override the URLs and user agent.

use std::num::NonZeroUsize;

pub const ADDRESS_LOOKUP_URL: &str =
    "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates";
pub const CARRIER_ROUTE_URL: &str = "https://tools.usps.com/tools/app/ziplookup/zipByAddress";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.0.71 Safari/537.0";

// Address-candidate lookup query parameters
pub const LOOKUP_COUNTRY_CODE: &str = "US";
pub const LOOKUP_FORMAT: &str = "json";
pub const LOOKUP_ALL_FIELDS: &str = "*";

// Report defaults
pub const DEFAULT_UPLOAD_FOLDER: &str = "web/files";
pub const DEFAULT_REPORT_FILENAME: &str = "data.json";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::MIN;

// Environment overrides
pub const ENV_DEPLOYMENT: &str = "ENRICH_ENV";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_BUCKET: &str = "SUPABASE_BUCKET";
