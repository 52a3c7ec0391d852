//! Timeline rendering for transfer metrics.
//!
//! The chart shows each phase as a bracketed span on the first row and the
//! cumulative timestamps below it. HTTPS transfers get a TLS Handshake span
//! and a `pretransfer` row; plain transfers omit both.

use crate::metrics::NormalizedMetrics;

/// ANSI color code used when none is configured (cyan).
pub const DEFAULT_COLOR: u8 = 36;

// Placeholders are seven characters wide, the same as a rendered value, so the
// templates read the way they print.
const HTTPS_TEMPLATE: &str = "  DNS Lookup   TCP Connection   TLS Handshake   Server Processing   Content Transfer
[   {r_dns}  |     {r_con}    |    {r_tls}    |      {r_srv}      |      {r_xfr}     ]
             |                |               |                   |                  |
    namelookup:{t_dns}        |               |                   |                  |
                        connect:{t_con}       |                   |                  |
                                    pretransfer:{t_pre}           |                  |
                                                      starttransfer:{t_srv}          |
                                                                                 total:{t_end}
";

const HTTP_TEMPLATE: &str = "  DNS Lookup   TCP Connection   Server Processing   Content Transfer
[   {r_dns}  |     {r_con}    |      {r_srv}      |      {r_xfr}     ]
             |                |                   |                  |
    namelookup:{t_dns}        |                   |                  |
                        connect:{t_con}           |                  |
                                      starttransfer:{t_srv}          |
                                                                 total:{t_end}
";

/// Renders [`NormalizedMetrics`] as a text timeline.
///
/// # Examples
///
/// ```
/// use curlstat::{metrics::NormalizedMetrics, TimelineFormatter};
///
/// let metrics = NormalizedMetrics { time_total: 12, range_transfer: 12, ..Default::default() };
/// let chart = TimelineFormatter::plain().render(&metrics, "http://localhost/");
///
/// assert!(chart.contains("total:12ms"));
/// assert!(!chart.contains("TLS Handshake"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineFormatter {
    color: Option<u8>,
}

impl TimelineFormatter {
    /// Creates a formatter that wraps values in the given ANSI color code,
    /// or leaves them uncolored when `color` is `None`.
    pub fn new(color: Option<u8>) -> Self {
        Self { color }
    }

    /// A formatter without terminal escapes.
    pub fn plain() -> Self {
        Self::new(None)
    }

    /// Renders the timeline. An `https://` URL selects the five-phase chart.
    pub fn render(&self, metrics: &NormalizedMetrics, url: &str) -> String {
        let template = if is_https(url) {
            HTTPS_TEMPLATE
        } else {
            HTTP_TEMPLATE
        };

        let span = |ms: i64| self.paint(&format!("{:^7}", format!("{}ms", ms)));
        let stamp = |ms: i64| self.paint(&format!("{:<7}", format!("{}ms", ms)));

        template
            .replace("{r_dns}", &span(metrics.range_dns))
            .replace("{r_con}", &span(metrics.range_connection))
            .replace("{r_tls}", &span(metrics.range_ssl))
            .replace("{r_srv}", &span(metrics.range_server))
            .replace("{r_xfr}", &span(metrics.range_transfer))
            .replace("{t_dns}", &stamp(metrics.time_namelookup))
            .replace("{t_con}", &stamp(metrics.time_connect))
            .replace("{t_pre}", &stamp(metrics.time_pretransfer))
            .replace("{t_srv}", &stamp(metrics.time_starttransfer))
            .replace("{t_end}", &stamp(metrics.time_total))
    }

    fn paint(&self, text: &str) -> String {
        match self.color {
            Some(code) => format!("\x1b[{}m{}\x1b[0m", code, text),
            None => text.to_string(),
        }
    }
}

impl Default for TimelineFormatter {
    fn default() -> Self {
        Self::new(Some(DEFAULT_COLOR))
    }
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}
