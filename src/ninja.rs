//! Fetching solar and wind profiles from the renewables.ninja weather-data API.
//!
//! Each kind of profile is fetched in its own thread. Requests are spaced out with fixed sleeps
//! plus an initial random jitter to stay within the API's rate limit.
use crate::error::CostError;
use crate::input::{input_err_msg, read_toml};
use crate::profile::{MAX_DISTINCT_YEARS, ProfileTable, yearly_profile_file_name};
use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, info};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::thread;
use std::time::Duration;
use strum::{Display, EnumIter, IntoEnumIterator};

/// The file holding the generation inputs for a model
pub const GENERATION_FILE_NAME: &str = "generation.toml";

/// The default base URL of the renewables.ninja API
pub const DEFAULT_BASE_URL: &str = "https://www.renewables.ninja/api/";

/// Default number of seconds to wait between requests made by a single thread
const DEFAULT_SLEEP_SECONDS: u64 = 12;

/// A kind of generation profile which can be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ProfileKind {
    /// PV output and irradiance
    Solar,
    /// Wind-turbine output
    Wind,
}

impl ProfileKind {
    /// The keyword identifying this kind of data in API requests
    pub fn api_keyword(self) -> &'static str {
        match self {
            Self::Solar => "pv",
            Self::Wind => "wind",
        }
    }
}

/// PV system parameters for solar requests
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolarParameters {
    /// Tilt of the panels from horizontal, in degrees
    pub tilt: f64,
    /// Compass bearing of the panels, in degrees
    pub azimuth: f64,
    /// Fraction of output lost in the system
    #[serde(default)]
    pub system_loss: f64,
    /// Whether the panels track the sun (0 = fixed, 1 = one axis, 2 = two axes)
    #[serde(default)]
    pub tracking: u8,
}

/// Turbine parameters for wind requests
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindParameters {
    /// Hub height in metres
    pub height: f64,
    /// Turbine model, as named by the API
    pub turbine: String,
}

/// Configuration for fetching generation profiles, read from `generation.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationInputs {
    /// API token
    pub token: String,
    /// Latitude of the site
    pub latitude: f64,
    /// Longitude of the site
    pub longitude: f64,
    /// Offset of local time from UTC, in hours
    #[serde(default)]
    pub time_difference: f64,
    /// First year to fetch
    pub start_year: u32,
    /// Last year to fetch (inclusive)
    pub end_year: u32,
    /// Seconds to wait between requests made by a single thread
    #[serde(default = "default_sleep_seconds")]
    pub sleep_seconds: u64,
    /// Base URL of the API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Prefix for the names of saved profile files
    #[serde(default)]
    pub prefix: String,
    /// Solar parameters. Solar profiles are only fetched if present.
    pub solar: Option<SolarParameters>,
    /// Wind parameters. Wind profiles are only fetched if present.
    pub wind: Option<WindParameters>,
}

fn default_sleep_seconds() -> u64 {
    DEFAULT_SLEEP_SECONDS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl GenerationInputs {
    /// Read generation inputs from the specified model directory.
    ///
    /// # Returns
    ///
    /// The generation inputs or `None` if the file is not present.
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Option<Self>> {
        let file_path = model_dir.as_ref().join(GENERATION_FILE_NAME);
        if !file_path.is_file() {
            return Ok(None);
        }

        let inputs: GenerationInputs = read_toml(&file_path)?;
        inputs.validate().with_context(|| input_err_msg(&file_path))?;
        Ok(Some(inputs))
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.token.is_empty(), "An API token must be provided");
        ensure!(
            (-90.0..=90.0).contains(&self.latitude),
            "latitude must be between -90 and 90"
        );
        ensure!(
            (-180.0..=180.0).contains(&self.longitude),
            "longitude must be between -180 and 180"
        );
        ensure!(
            self.start_year <= self.end_year,
            "start_year must not be after end_year"
        );

        Ok(())
    }

    /// Check that enough years are fetched to build profiles for a system lifetime of
    /// `max_years` years.
    ///
    /// Total profiles are built from up to the first ten yearly profiles, so every one of those
    /// years must lie between `start_year` and `end_year`.
    pub fn check_covers_lifetime(&self, max_years: u32) -> Result<()> {
        let required = max_years.min(MAX_DISTINCT_YEARS);
        let fetched = (self.end_year + 1).saturating_sub(self.start_year);
        ensure!(
            fetched >= required,
            "start_year ({}) to end_year ({}) covers {fetched} years, but a {max_years}-year \
             system lifetime needs profiles for {required} years",
            self.start_year,
            self.end_year
        );

        Ok(())
    }

    /// The kinds of profile for which parameters were provided
    pub fn profile_kinds(&self) -> Vec<ProfileKind> {
        ProfileKind::iter()
            .filter(|kind| match kind {
                ProfileKind::Solar => self.solar.is_some(),
                ProfileKind::Wind => self.wind.is_some(),
            })
            .collect()
    }

    /// Query parameters for a request for the given kind of profile in the given year
    fn query(&self, kind: ProfileKind, year: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("date_from", format!("{year}-01-01")),
            ("date_to", format!("{year}-12-31")),
            ("capacity", "1".to_string()),
            ("format", "json".to_string()),
            ("header", "true".to_string()),
        ];

        match kind {
            ProfileKind::Solar => {
                if let Some(solar) = &self.solar {
                    query.extend([
                        ("tilt", solar.tilt.to_string()),
                        ("azim", solar.azimuth.to_string()),
                        ("system_loss", solar.system_loss.to_string()),
                        ("tracking", solar.tracking.to_string()),
                        ("raw", "true".to_string()),
                    ]);
                }
            }
            ProfileKind::Wind => {
                if let Some(wind) = &self.wind {
                    query.extend([
                        ("height", wind.height.to_string()),
                        ("turbine", wind.turbine.clone()),
                    ]);
                }
            }
        }

        query
    }
}

/// A blocking client for the renewables.ninja API
pub struct NinjaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl NinjaClient {
    /// Create a client for the API at `base_url`
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token: token.to_string(),
        })
    }

    /// Fetch a single year of a profile, converted to local time.
    ///
    /// Solar profiles gain a total irradiance column.
    pub fn fetch_year(
        &self,
        inputs: &GenerationInputs,
        kind: ProfileKind,
        year: u32,
    ) -> Result<ProfileTable> {
        let url = format!("{}data/{}", self.base_url, kind.api_keyword());
        debug!("Calling renewables.ninja at {url} for {kind} data for {year}");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .query(&inputs.query(kind, year))
            .send()
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        let body = response.text().context("Failed to read response body")?;
        ensure!(
            status.is_success(),
            "renewables.ninja returned error {status}: {body}"
        );

        let mut table = parse_response(&body, year)?;
        table.to_local_time(inputs.time_difference);
        if kind == ProfileKind::Solar {
            add_total_irradiance(&mut table)?;
        }

        Ok(table)
    }
}

/// Parse the body of an API response into a profile.
///
/// The body must be a JSON object whose `data` field maps timestamps to records of named values.
/// Records are kept in document order. For leap years, the hours of 29 February are dropped.
pub fn parse_response(body: &str, year: u32) -> Result<ProfileTable, CostError> {
    let malformed = |msg: &str| CostError::MalformedResponse(msg.to_string());

    let response: Value =
        serde_json::from_str(body).map_err(|err| CostError::MalformedResponse(err.to_string()))?;
    let data = response
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("no data object"))?;

    let mut records = data.values();
    let Some(first) = records.next() else {
        return Err(malformed("data object is empty"));
    };
    let columns: Vec<String> = first
        .as_object()
        .ok_or_else(|| malformed("records must be objects"))?
        .keys()
        .cloned()
        .collect();

    let rows = data
        .values()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    record
                        .get(column)
                        .and_then(Value::as_f64)
                        .ok_or_else(|| malformed(&format!("missing or invalid {column} value")))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = ProfileTable::from_rows(columns, rows)
        .map_err(|err| CostError::MalformedResponse(err.to_string()))?;
    if is_leap_year(year) {
        table.remove_leap_day();
    }

    Ok(table)
}

/// Whether a year has a 29 February
fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Add an `irradiance_total` column, the sum of direct and diffuse irradiance
fn add_total_irradiance(table: &mut ProfileTable) -> Result<()> {
    let find = |name: &str| {
        table
            .columns()
            .iter()
            .position(|column| column == name)
            .with_context(|| format!("Solar data has no {name} column"))
    };
    let direct = find("irradiance_direct")?;
    let diffuse = find("irradiance_diffuse")?;
    table.push_column("irradiance_total", |row| row[direct] + row[diffuse]);

    Ok(())
}

/// Fetch every configured kind of profile for each year, saving one file per year to `dir`.
///
/// Years for which a file already exists are skipped unless `regenerate` is set. Each kind of
/// profile is fetched in its own thread; an error in any thread aborts the fetch.
pub fn fetch_profiles(inputs: &GenerationInputs, dir: &Path, regenerate: bool) -> Result<()> {
    let kinds = inputs.profile_kinds();
    if kinds.is_empty() {
        info!("No solar or wind parameters provided; nothing to fetch");
        return Ok(());
    }

    let client = NinjaClient::new(&inputs.base_url, &inputs.token)?;
    let sleep_seconds = inputs.sleep_seconds * kinds.len() as u64;

    thread::scope(|scope| {
        let handles: Vec<_> = kinds
            .iter()
            .map(|&kind| {
                let client = &client;
                scope.spawn(move || {
                    fetch_profile_years(client, inputs, kind, dir, regenerate, sleep_seconds)
                })
            })
            .collect();

        for (kind, handle) in kinds.iter().zip(handles) {
            handle
                .join()
                .map_err(|_| anyhow!("Thread fetching {kind} profiles panicked"))?
                .with_context(|| format!("Failed to fetch {kind} profiles"))?;
        }

        Ok(())
    })
}

/// Fetch all the years of a single kind of profile
fn fetch_profile_years(
    client: &NinjaClient,
    inputs: &GenerationInputs,
    kind: ProfileKind,
    dir: &Path,
    regenerate: bool,
    sleep_seconds: u64,
) -> Result<()> {
    info!("Fetching {kind} profiles");

    // Spread out the first requests of each thread
    let jitter = rand::rng().random_range(0..=sleep_seconds);
    thread::sleep(Duration::from_secs(jitter));

    for year in inputs.start_year..=inputs.end_year {
        let file_path = dir.join(yearly_profile_file_name(&inputs.prefix, &kind.to_string(), year));
        if file_path.is_file() && !regenerate {
            info!("Data file for {kind} in {year} already exists, skipping");
            continue;
        }

        info!("Fetching {kind} data for {year}");
        let table = client.fetch_year(inputs, kind, year)?;
        table.write(&file_path)?;
        info!("{kind} profile for {year} saved to {}", file_path.display());

        if year != inputs.end_year {
            thread::sleep(Duration::from_secs(sleep_seconds));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FEB_29;
    use mockito::{Matcher, Server};
    use rstest::{fixture, rstest};
    use serde_json::{Map, json};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn inputs() -> GenerationInputs {
        GenerationInputs {
            token: "secret".to_string(),
            latitude: 51.5,
            longitude: -0.1,
            time_difference: 0.0,
            start_year: 2015,
            end_year: 2015,
            sleep_seconds: 0,
            base_url: DEFAULT_BASE_URL.to_string(),
            prefix: String::new(),
            solar: Some(SolarParameters {
                tilt: 30.0,
                azimuth: 180.0,
                system_loss: 0.0,
                tracking: 0,
            }),
            wind: None,
        }
    }

    /// A response body containing `hours` hours of solar data
    fn solar_body(hours: usize) -> String {
        let data: Map<_, _> = (0..hours)
            .map(|hour| {
                (
                    format!("{hour:06}"),
                    json!({
                        "electricity": hour as f64,
                        "irradiance_direct": 2.0,
                        "irradiance_diffuse": 1.0,
                        "temperature": 20.0,
                    }),
                )
            })
            .collect();
        json!({ "data": data, "metadata": {} }).to_string()
    }

    #[test]
    fn test_profile_kind() {
        assert_eq!(ProfileKind::Solar.to_string(), "solar");
        assert_eq!(ProfileKind::Solar.api_keyword(), "pv");
        assert_eq!(ProfileKind::Wind.api_keyword(), "wind");
    }

    #[test]
    fn test_generation_inputs_from_path() {
        let dir = tempdir().unwrap();
        assert!(GenerationInputs::from_path(dir.path()).unwrap().is_none());

        let mut file = File::create(dir.path().join(GENERATION_FILE_NAME)).unwrap();
        writeln!(
            file,
            "token = \"abc\"\nlatitude = 10.0\nlongitude = 20.0\nstart_year = 2010\n\
             end_year = 2012\n\n[wind]\nheight = 80\nturbine = \"Vestas V80 2000\""
        )
        .unwrap();

        let inputs = GenerationInputs::from_path(dir.path()).unwrap().unwrap();
        assert_eq!(inputs.sleep_seconds, DEFAULT_SLEEP_SECONDS);
        assert_eq!(inputs.base_url, DEFAULT_BASE_URL);
        assert_eq!(inputs.profile_kinds(), [ProfileKind::Wind]);
    }

    #[rstest]
    fn test_generation_inputs_validate(mut inputs: GenerationInputs) {
        assert!(inputs.validate().is_ok());
        inputs.start_year = 2020;
        assert!(inputs.validate().is_err());
    }

    #[rstest]
    #[case(2015, 2015, 1, true)]
    #[case(2015, 2015, 2, false)]
    #[case(2010, 2019, 20, true)]
    #[case(2010, 2018, 20, false)]
    #[case(2010, 2012, 3, true)]
    fn test_check_covers_lifetime(
        mut inputs: GenerationInputs,
        #[case] start_year: u32,
        #[case] end_year: u32,
        #[case] max_years: u32,
        #[case] ok: bool,
    ) {
        inputs.start_year = start_year;
        inputs.end_year = end_year;
        assert_eq!(inputs.check_covers_lifetime(max_years).is_ok(), ok);
    }

    #[test]
    fn test_parse_response() {
        let table = parse_response(&solar_body(8760), 2015).unwrap();
        assert_eq!(table.len(), 8760);
        assert_eq!(
            table.columns(),
            [
                "electricity",
                "irradiance_direct",
                "irradiance_diffuse",
                "temperature"
            ]
        );
        assert_eq!(table.column("electricity").unwrap()[100], 100.0);
    }

    #[test]
    fn test_parse_response_leap_year() {
        let table = parse_response(&solar_body(8784), 2016).unwrap();
        assert_eq!(table.len(), 8760);
        let electricity = table.column("electricity").unwrap();
        assert_eq!(electricity[FEB_29], (FEB_29 + 24) as f64);
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"metadata": {}}"#)]
    #[case(r#"{"data": {}}"#)]
    #[case(r#"{"data": {"0": {"electricity": "high"}}}"#)]
    fn test_parse_response_malformed(#[case] body: &str) {
        assert!(matches!(
            parse_response(body, 2015),
            Err(CostError::MalformedResponse(_))
        ));
    }

    #[rstest]
    fn test_fetch_year(mut inputs: GenerationInputs) {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/data/pv")
            .match_header("authorization", "Token secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("date_from".into(), "2015-01-01".into()),
                Matcher::UrlEncoded("date_to".into(), "2015-12-31".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(solar_body(8760))
            .create();

        inputs.time_difference = 1.0;
        let client = NinjaClient::new(&format!("{}/", server.url()), &inputs.token).unwrap();
        let table = client.fetch_year(&inputs, ProfileKind::Solar, 2015).unwrap();

        mock.assert();
        assert_eq!(table.column("irradiance_total").unwrap(), vec![3.0; 8760]);
        let electricity = table.column("electricity").unwrap();
        assert_eq!(electricity[0], 8759.0);
        assert_eq!(electricity[1], 0.0);
    }

    #[rstest]
    fn test_fetch_year_error_status(inputs: GenerationInputs) {
        let mut server = Server::new();
        server
            .mock("GET", "/data/pv")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("Forbidden")
            .create();

        let client = NinjaClient::new(&format!("{}/", server.url()), &inputs.token).unwrap();
        assert!(client.fetch_year(&inputs, ProfileKind::Solar, 2015).is_err());
    }

    #[rstest]
    fn test_fetch_profiles(mut inputs: GenerationInputs) {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/data/pv")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(solar_body(8760))
            .expect(1)
            .create();

        let dir = tempdir().unwrap();
        inputs.base_url = format!("{}/", server.url());
        inputs.end_year = 2016;

        // The file for 2016 already exists, so only 2015 should be fetched
        let existing = ProfileTable::from_rows(vec!["electricity".into()], vec![vec![1.0]]).unwrap();
        existing
            .write(&dir.path().join("solar_generation_2016.csv"))
            .unwrap();

        fetch_profiles(&inputs, dir.path(), false).unwrap();
        mock.assert();

        let fetched = ProfileTable::from_path(&dir.path().join("solar_generation_2015.csv")).unwrap();
        assert_eq!(fetched.len(), 8760);
        assert_eq!(fetched.columns().len(), 5);
        let kept = ProfileTable::from_path(&dir.path().join("solar_generation_2016.csv")).unwrap();
        assert_eq!(kept, existing);
    }
}
