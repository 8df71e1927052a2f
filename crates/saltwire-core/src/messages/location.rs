//! Geolocation message body.
//!
//! Locations travel as UTF-8 text rather than a packed record: the first
//! line is `latitude,longitude` or `latitude,longitude,accuracy`, an
//! optional second line names a point of interest, and an optional third
//! line carries its address with newlines escaped as `\n`. Lines past the
//! third are ignored for forward compatibility.

use saltwire_proto::limits::MAX_CAPTION_LEN;

use crate::error::DecodeError;
use crate::messages::BodyReader;

/// A decoded location with optional point-of-interest lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMessage {
    /// Latitude in degrees. Always finite.
    pub latitude: f64,
    /// Longitude in degrees. Always finite.
    pub longitude: f64,
    /// Horizontal accuracy in meters, if the sender knew it.
    pub accuracy: Option<f64>,
    /// Point-of-interest name.
    pub poi_name: Option<String>,
    /// Point-of-interest address, unescaped.
    pub poi_address: Option<String>,
}

impl LocationMessage {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        let text = r.rest_utf8()?;
        let mut lines = text.split('\n');
        let Some(coordinates) = lines.next() else {
            unreachable!("split always yields at least one item");
        };

        let mut parts = coordinates.split(',');
        let Some(latitude_text) = parts.next() else {
            unreachable!("split always yields at least one item");
        };
        let longitude_text =
            parts.next().ok_or_else(|| r.invalid("coordinates must be lat,lon[,accuracy]"))?;
        let accuracy_text = parts.next();
        if parts.next().is_some() {
            return Err(r.invalid("coordinates must be lat,lon[,accuracy]"));
        }

        let latitude = parse_coordinate(r, latitude_text, "invalid latitude")?;
        let longitude = parse_coordinate(r, longitude_text, "invalid longitude")?;
        let accuracy = match accuracy_text {
            Some(text) => Some(parse_coordinate(r, text, "invalid accuracy")?),
            None => None,
        };

        let poi_name = lines.next().filter(|line| !line.is_empty()).map(str::to_owned);
        let poi_address = lines
            .next()
            .filter(|line| !line.is_empty())
            .map(|line| line.replace("\\n", "\n"));

        let poi_len = poi_name.as_ref().map_or(0, String::len)
            + poi_address.as_ref().map_or(0, String::len);
        if poi_len > MAX_CAPTION_LEN {
            return Err(r.invalid("poi text exceeds the caption limit"));
        }

        Ok(Self { latitude, longitude, accuracy, poi_name, poi_address })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        let mut text = format!("{},{}", self.latitude, self.longitude);
        if let Some(accuracy) = self.accuracy {
            text.push_str(&format!(",{accuracy}"));
        }
        if self.poi_name.is_some() || self.poi_address.is_some() {
            text.push('\n');
            if let Some(name) = &self.poi_name {
                // A newline inside the name would shift the address line.
                text.push_str(&name.replace('\n', " "));
            }
        }
        if let Some(address) = &self.poi_address {
            text.push('\n');
            text.push_str(&address.replace('\n', "\\n"));
        }
        out.extend_from_slice(text.as_bytes());
    }
}

fn parse_coordinate(
    r: &BodyReader<'_>,
    text: &str,
    reason: &'static str,
) -> Result<f64, DecodeError> {
    let value: f64 = text.parse().map_err(|_| r.invalid(reason))?;
    if value.is_finite() { Ok(value) } else { Err(r.invalid(reason)) }
}
