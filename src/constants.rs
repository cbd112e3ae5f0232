// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API contract
// ---------------------------------------------------------------------------

/// Base URL of the versioned Notion REST API.
pub const API_BASE_URL: &str = "https://api.notion.com/v1";

/// Value of the `Notion-Version` header every request carries.
pub const NOTION_VERSION: &str = "2022-06-28";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100.
pub const NOTION_API_PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Resilience defaults
// ---------------------------------------------------------------------------

/// Retries after the first attempt of a call.
pub const DEFAULT_RETRIES: u32 = 3;

/// Hard deadline for one outbound call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// First backoff delay; doubles with every retry.
pub const RETRY_BACKOFF_INITIAL: Duration = Duration::from_millis(500);

/// Ceiling for the backoff delay.
pub const RETRY_BACKOFF_MAX: Duration = Duration::from_secs(8);

/// Client identification headers rotated together with the bearer token.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 13_2_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G981B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.162 Mobile Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 13_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/87.0.4280.77 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 8.0; Pixel 2 Build/OPD3.170816.012) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/102.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (X11; Linux aarch64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.188 Safari/537.36 CrKey/1.54.250320",
    "Mozilla/5.0 (Linux; Android 11; Pixel 3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.181 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 10 Build/MOB31T) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/102.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 10_3_1 like Mac OS X) AppleWebKit/603.1.30 (KHTML, like Gecko) Version/10.0 Mobile/14E304 Safari/602.1",
    "Mozilla/5.0 (iPad; CPU OS 11_0 like Mac OS X) AppleWebKit/604.1.34 (KHTML, like Gecko) Version/11.0 Mobile/15A5341f Safari/604.1",
    "Mozilla/5.0 (Windows Phone 10.0; Android 4.2.1; Microsoft; Lumia 550) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/46.0.2486.0 Mobile Safari/537.36 Edge/14.14263",
];

// ---------------------------------------------------------------------------
// Row vocabulary
// ---------------------------------------------------------------------------

/// Column holding the service's resource identifier on every row.
pub const ID_COLUMN: &str = "id";

/// Column holding the typed content block of a page row.
pub const BLOCK_COLUMN: &str = "block";

/// Column holding the nested table fetched for a row with children.
pub const CHILDREN_COLUMN: &str = "children";

/// Column holding the source URL of an image block.
pub const IMAGE_SOURCE_COLUMN: &str = "image_source_path";

/// Column holding the local path of a downloaded image.
pub const IMAGE_DOWNLOAD_COLUMN: &str = "image_download_path";

/// Recorded in [`IMAGE_DOWNLOAD_COLUMN`] when the image could not be fetched.
pub const IMAGE_DOWNLOAD_FAILED: &str = "wrong_request";
