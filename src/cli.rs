//! Command-line parsing and validation.

use crate::error::CliError;
use crate::locations::{MAX_LOCATIONS, decode_share_param};
use crate::types::Location;
use chrono::NaiveDate;

type CliResult<T> = Result<T, CliError>;

const DEFAULT_STEP_DAYS: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    /// Primary location first, comparisons after, directory order.
    pub locations: Vec<Location>,
    /// Overrides "today" for the series window. Defaults to the system
    /// date at runtime.
    pub reference_date: Option<NaiveDate>,
    pub table: bool,
    pub step_days: usize,
    pub print_link: bool,
}

pub fn parse_cli(args: Vec<String>) -> CliResult<CliOptions> {
    if args.len() < 2 {
        return Err(CliError::Exit(
            "Usage: yearlight [OPTIONS] <latitude> <longitude>".to_string(),
        ));
    }

    let mut positional = Vec::new();
    let mut name: Option<String> = None;
    let mut compares: Vec<Location> = Vec::new();
    let mut from_link: Option<Vec<Location>> = None;
    let mut reference_date = None;
    let mut table = false;
    let mut step_days = DEFAULT_STEP_DAYS;
    let mut print_link = false;

    for arg in args.into_iter().skip(1) {
        if let Some(stripped) = arg.strip_prefix("--") {
            let (option, value) = stripped
                .split_once('=')
                .map(|(n, v)| (n, Some(v)))
                .unwrap_or((stripped, None));
            match option {
                "name" => name = Some(required_value("name", value)?.to_string()),
                "compare" => {
                    let location = parse_compare(required_value("compare", value)?)?;
                    if compares.len() >= MAX_LOCATIONS - 1 {
                        return Err(format!(
                            "At most {} --compare locations are supported",
                            MAX_LOCATIONS - 1
                        )
                        .into());
                    }
                    compares.push(location);
                }
                "locs" => {
                    let decoded = decode_share_param(required_value("locs", value)?)
                        .map_err(|e| CliError::from(format!("Invalid --locs value: {}", e)))?;
                    if decoded.is_empty() {
                        return Err("--locs contains no locations".into());
                    }
                    from_link = Some(decoded);
                }
                "date" => {
                    let v = required_value("date", value)?;
                    reference_date = Some(
                        NaiveDate::parse_from_str(v, "%Y-%m-%d")
                            .map_err(|_| CliError::from(format!("Invalid date: {}", v)))?,
                    );
                }
                "step-days" => {
                    let v = required_value("step-days", value)?;
                    step_days = v
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n >= 1)
                        .ok_or_else(|| {
                            CliError::from(format!("Invalid step-days value: {}", v))
                        })?;
                }
                "table" => reject_value("table", value).map(|_| table = true)?,
                "link" => reject_value("link", value).map(|_| print_link = true)?,
                "help" => return Err(CliError::Exit(get_help_text())),
                "version" => return Err(CliError::Exit(get_version_text())),
                _ => return Err(format!("Unknown option: --{}", option).into()),
            }
        } else {
            positional.push(arg);
        }
    }

    let mut locations = match from_link {
        Some(decoded) => {
            if !positional.is_empty() {
                return Err("Coordinates and --locs cannot be combined".into());
            }
            decoded
        }
        None => {
            let (default_label, lat, lng) = match positional.as_slice() {
                // Options only: fall back to the built-in location.
                [] => {
                    let d = crate::engine::default_location();
                    (d.name, d.lat, d.lng)
                }
                [lat_str, lng_str] => {
                    let (lat, lng) = parse_coordinates(lat_str, lng_str)?;
                    (format!("{:.4}, {:.4}", lat, lng), lat, lng)
                }
                _ => {
                    return Err(
                        "Expected exactly two arguments: <latitude> <longitude>".into()
                    );
                }
            };
            let label = name.unwrap_or(default_label);
            let mut primary = Location::new(label, lat, lng);
            primary.is_primary = true;
            let mut locations = vec![primary];
            locations.extend(compares);
            locations
        }
    };

    if locations.len() > MAX_LOCATIONS {
        return Err(format!("At most {} locations are supported", MAX_LOCATIONS).into());
    }
    if !locations.iter().any(|l| l.is_primary) {
        locations[0].is_primary = true;
    }
    for (i, location) in locations.iter_mut().enumerate() {
        location.color_index = i;
    }

    Ok(CliOptions {
        locations,
        reference_date,
        table,
        step_days,
        print_link,
    })
}

fn required_value<'a>(flag: &'static str, value: Option<&'a str>) -> CliResult<&'a str> {
    value.ok_or_else(|| CliError::from(format!("Option --{} requires a value", flag)))
}

fn reject_value(flag: &'static str, value: Option<&str>) -> CliResult<()> {
    if value.is_some() {
        return Err(format!("Option --{} does not take a value", flag).into());
    }
    Ok(())
}

fn parse_coordinates(lat_str: &str, lng_str: &str) -> CliResult<(f64, f64)> {
    let lat = lat_str
        .parse::<f64>()
        .map_err(|_| CliError::from(format!("Invalid latitude: {}", lat_str)))?;
    let lng = lng_str
        .parse::<f64>()
        .map_err(|_| CliError::from(format!("Invalid longitude: {}", lng_str)))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Latitude out of range (-90 to 90): {}", lat_str).into());
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("Longitude out of range (-180 to 180): {}", lng_str).into());
    }
    Ok((lat, lng))
}

/// `--compare=lat,lng[,name]`.
fn parse_compare(value: &str) -> CliResult<Location> {
    let mut parts = value.splitn(3, ',');
    let (Some(lat_str), Some(lng_str)) = (parts.next(), parts.next()) else {
        return Err(format!("Invalid --compare value: {}", value).into());
    };
    let (lat, lng) = parse_coordinates(lat_str.trim(), lng_str.trim())?;
    let name = parts
        .next()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{:.4}, {:.4}", lat, lng));
    Ok(Location::new(name, lat, lng))
}

fn get_version_text() -> String {
    format!("yearlight {}", env!("CARGO_PKG_VERSION"))
}

fn get_help_text() -> String {
    format!(
        r#"yearlight {}
Shows a year of daylight for a location: sunrise, sunset, day length,
and how fast it is changing.

Usage:
  yearlight [OPTIONS] <latitude> <longitude>
  yearlight [OPTIONS] --locs=<json>
  yearlight [OPTIONS]                  (built-in default: New York, NY)

Examples:
  yearlight 40.7128 -74.0060 --name="New York, NY"
  yearlight 59.9139 10.7522 --compare=78.22,15.64,Longyearbyen
  yearlight 40.7128 -74.0060 --table --step-days=7
  yearlight --locs='[{{"n":"Oslo","la":59.9139,"ln":10.7522,"p":1}}]'

Arguments:
  <latitude>            Decimal degrees, -90 to +90.
  <longitude>           Decimal degrees, -180 to +180.

Options:
  --name=<name>         Display name for the location. Default: the
                        coordinates.
  --compare=<lat,lng[,name]>
                        Additional location to show alongside the first.
                        May be given up to {} times.
  --locs=<json>         Load the full location set from a shareable-link
                        value instead of coordinates.
  --date=<YYYY-MM-DD>   Reference date for the series window.
                        Default: today.
  --table               Print the year as a table instead of the
                        today summary.
  --step-days=<n>       Row spacing for --table. Default: {}
  --link                Print the shareable-link value for the
                        location set and exit.
  --help                Show this help message and exit.
  --version             Print version information and exit.
"#,
        env!("CARGO_PKG_VERSION"),
        MAX_LOCATIONS - 1,
        DEFAULT_STEP_DAYS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliResult<CliOptions> {
        let mut full = vec!["yearlight".to_string()];
        full.extend(args.iter().map(|s| s.to_string()));
        parse_cli(full)
    }

    #[test]
    fn test_basic_coordinates() {
        let options = parse(&["40.7128", "-74.0060"]).unwrap();
        assert_eq!(options.locations.len(), 1);
        assert_eq!(options.locations[0].lat, 40.7128);
        assert!(options.locations[0].is_primary);
        assert_eq!(options.locations[0].name, "40.7128, -74.0060");
        assert!(!options.table);
    }

    #[test]
    fn test_name_and_compare() {
        let options = parse(&[
            "40.7128",
            "-74.0060",
            "--name=New York, NY",
            "--compare=59.9139,10.7522,Oslo",
        ])
        .unwrap();
        assert_eq!(options.locations.len(), 2);
        assert_eq!(options.locations[0].name, "New York, NY");
        assert_eq!(options.locations[1].name, "Oslo");
        assert!(!options.locations[1].is_primary);
        assert_eq!(options.locations[1].color_index, 1);
    }

    #[test]
    fn test_too_many_compares() {
        let result = parse(&[
            "0.0",
            "0.0",
            "--compare=1.0,1.0",
            "--compare=2.0,2.0",
            "--compare=3.0,3.0",
        ]);
        assert!(matches!(result, Err(CliError::Message(_))));
    }

    #[test]
    fn test_latitude_range_check() {
        let result = parse(&["91.0", "0.0"]);
        let Err(CliError::Message(message)) = result else {
            panic!("expected error");
        };
        assert!(message.contains("Latitude out of range"));
    }

    #[test]
    fn test_date_override() {
        let options = parse(&["40.0", "-74.0", "--date=2025-06-21"]).unwrap();
        assert_eq!(
            options.reference_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap())
        );
        assert!(parse(&["40.0", "-74.0", "--date=junk"]).is_err());
    }

    #[test]
    fn test_locs_loads_location_set() {
        let options = parse(&[
            r#"--locs=[{"n":"Oslo","la":59.9139,"ln":10.7522,"p":1},{"n":"Bergen","la":60.39,"ln":5.32,"p":0}]"#,
        ])
        .unwrap();
        assert_eq!(options.locations.len(), 2);
        assert!(options.locations[0].is_primary);
        assert_eq!(options.locations[1].name, "Bergen");
    }

    #[test]
    fn test_locs_excludes_positional() {
        let result = parse(&["40.0", "-74.0", r#"--locs=[{"n":"X","la":1,"ln":2,"p":1}]"#]);
        assert!(result.is_err());
    }

    #[test]
    fn test_options_only_use_default_location() {
        let options = parse(&["--date=2025-06-21"]).unwrap();
        assert_eq!(options.locations.len(), 1);
        assert_eq!(options.locations[0].name, "New York, NY");
        assert!(options.locations[0].is_primary);
    }

    #[test]
    fn test_no_args_prints_usage() {
        let result = parse_cli(vec!["yearlight".to_string()]);
        assert!(matches!(result, Err(CliError::Exit(_))));
    }

    #[test]
    fn test_table_flag_and_step() {
        let options = parse(&["40.0", "-74.0", "--table", "--step-days=7"]).unwrap();
        assert!(options.table);
        assert_eq!(options.step_days, 7);
        assert!(parse(&["40.0", "-74.0", "--step-days=0"]).is_err());
        assert!(parse(&["40.0", "-74.0", "--table=yes"]).is_err());
    }

    #[test]
    fn test_unknown_option() {
        let result = parse(&["40.0", "-74.0", "--bogus"]);
        let Err(CliError::Message(message)) = result else {
            panic!("expected error");
        };
        assert_eq!(message, "Unknown option: --bogus");
    }
}
