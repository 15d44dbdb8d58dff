use crate::{DnsError, DnsResult};

use std::fmt;
use std::str::FromStr;

/// Target of a service-locator record, written as `priority weight port host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub host: String,
}

impl ServiceTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            priority: 0,
            weight: 0,
            port,
            host: host.into(),
        }
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.priority, self.weight, self.port, self.host)
    }
}

impl FromStr for ServiceTarget {
    type Err = DnsError;

    fn from_str(s: &str) -> DnsResult<Self> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        let [priority, weight, port, host] = parts.as_slice() else {
            return Err(DnsError::invalid_record(format!(
                "service target must be 'priority weight port host', got '{s}'"
            )));
        };

        let number = |field: &str, value: &str| {
            value.parse::<u16>().map_err(|_| {
                DnsError::invalid_record(format!("service target {field} '{value}' is not a number"))
            })
        };

        Ok(Self {
            priority: number("priority", priority)?,
            weight: number("weight", weight)?,
            port: number("port", port)?,
            host: host.trim_end_matches('.').to_string(),
        })
    }
}
