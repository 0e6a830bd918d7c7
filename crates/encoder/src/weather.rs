//! Weather field segment
//!
//! `<dir>/<spd>g<gust>t<temp>r<rainHr>p<rain24>P<rainMid>h<hum>b<press>`

use std::fmt::Write;

use contracts::WeatherRecord;

/// Encode the weather field segment of a record
pub fn encode_weather_fields(record: &WeatherRecord) -> String {
    let mut out = String::with_capacity(40);
    push_field(&mut out, record.wind_direction, 3);
    out.push('/');
    push_field(&mut out, record.wind_speed, 3);
    out.push('g');
    push_field(&mut out, record.wind_gust, 3);
    out.push('t');
    push_temperature(&mut out, record.temperature);
    out.push('r');
    push_field(&mut out, record.rain_last_hour, 3);
    out.push('p');
    push_field(&mut out, record.rain_last_24h, 3);
    out.push('P');
    push_field(&mut out, record.rain_since_midnight, 3);
    out.push('h');
    push_humidity(&mut out, record.humidity);
    out.push('b');
    push_field(&mut out, record.pressure, 5);
    out
}

fn push_dots(out: &mut String, width: usize) {
    out.extend(std::iter::repeat('.').take(width));
}

/// Truncated toward zero; absent and non-finite values are `None`
fn whole(value: Option<f64>) -> Option<i64> {
    value.filter(|v| v.is_finite()).map(|v| v.trunc() as i64)
}

fn max_for(width: usize) -> i64 {
    10_i64.pow(width as u32) - 1
}

fn push_field(out: &mut String, value: Option<f64>, width: usize) {
    match whole(value) {
        Some(v) => {
            let _ = write!(out, "{:0width$}", v.clamp(0, max_for(width)));
        }
        None => push_dots(out, width),
    }
}

fn push_temperature(out: &mut String, value: Option<f64>) {
    match whole(value) {
        Some(v) => {
            let _ = write!(out, "{:03}", v.clamp(-99, 999));
        }
        None => push_dots(out, 3),
    }
}

fn push_humidity(out: &mut String, value: Option<f64>) {
    match whole(value) {
        // 100% is sent as 00
        Some(v) if v >= 100 => out.push_str("00"),
        Some(v) => {
            let _ = write!(out, "{:02}", v.max(0));
        }
        None => push_dots(out, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_is_all_dots() {
        assert_eq!(
            encode_weather_fields(&WeatherRecord::default()),
            ".../...g...t...r...p...P...h..b....."
        );
    }

    #[test]
    fn station_example() {
        let record = WeatherRecord {
            wind_speed: Some(12.0),
            temperature: Some(32.0),
            ..Default::default()
        };
        assert_eq!(
            encode_weather_fields(&record),
            ".../012g...t032r...p...P...h..b....."
        );
    }

    #[test]
    fn full_record() {
        let record = WeatherRecord {
            wind_direction: Some(220.0),
            wind_speed: Some(4.0),
            wind_gust: Some(5.0),
            temperature: Some(77.9),
            rain_last_hour: Some(0.0),
            rain_last_24h: Some(0.0),
            rain_since_midnight: Some(0.0),
            humidity: Some(50.0),
            pressure: Some(10132.07),
            ..Default::default()
        };
        assert_eq!(
            encode_weather_fields(&record),
            "220/004g005t077r000p000P000h50b10132"
        );
    }

    #[test]
    fn zero_is_present() {
        let record = WeatherRecord {
            wind_gust: Some(0.0),
            ..Default::default()
        };
        assert!(encode_weather_fields(&record).contains("g000t"));
    }

    #[test]
    fn temperature_clamp_boundaries() {
        let temp = |t: f64| {
            let record = WeatherRecord {
                temperature: Some(t),
                ..Default::default()
            };
            let segment = encode_weather_fields(&record);
            let start = segment.find('t').unwrap() + 1;
            segment[start..start + 3].to_string()
        };
        assert_eq!(temp(-101.0), "-99");
        assert_eq!(temp(-100.0), "-99");
        assert_eq!(temp(-99.0), "-99");
        assert_eq!(temp(-5.7), "-05");
        assert_eq!(temp(1000.0), "999");
    }

    #[test]
    fn humidity_boundaries() {
        let hum = |h: f64| {
            let record = WeatherRecord {
                humidity: Some(h),
                ..Default::default()
            };
            let segment = encode_weather_fields(&record);
            let start = segment.find('h').unwrap() + 1;
            segment[start..start + 2].to_string()
        };
        assert_eq!(hum(99.0), "99");
        // 100% wraps to 00 on the wire, kept as the receiving side expects it
        assert_eq!(hum(100.0), "00");
        assert_eq!(hum(101.0), "00");
        assert_eq!(hum(5.0), "05");
    }

    #[test]
    fn negative_and_oversized_values_are_clamped() {
        let record = WeatherRecord {
            wind_speed: Some(-3.0),
            pressure: Some(123_456.0),
            ..Default::default()
        };
        let segment = encode_weather_fields(&record);
        assert!(segment.contains("/000g"), "{segment}");
        assert!(segment.ends_with("b99999"), "{segment}");
    }
}
