// Resource and tab domain models
use std::fmt;
use std::time::Duration;

/// One of the four independently-polled dashboard data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Stats,
    Incidents,
    Alerts,
    Logs,
}

impl Resource {
    /// The four resource kinds, fixed for the dashboard's lifetime.
    pub const ALL: [Resource; 4] = [
        Resource::Stats,
        Resource::Incidents,
        Resource::Alerts,
        Resource::Logs,
    ];

    /// URL suffix appended to the dashboard API base path.
    pub fn endpoint_suffix(&self) -> &'static str {
        match self {
            Resource::Stats => "/stats",
            Resource::Incidents => "/incidents",
            Resource::Alerts => "/alerts",
            Resource::Logs => "/logs",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Stats => "stats",
            Resource::Incidents => "incidents",
            Resource::Alerts => "alerts",
            Resource::Logs => "logs",
        }
    }

    /// Poll cadence used when the configuration does not override it.
    pub fn default_poll_interval(&self) -> Duration {
        match self {
            Resource::Stats => Duration::from_millis(3000),
            Resource::Incidents => Duration::from_millis(5000),
            Resource::Alerts => Duration::from_millis(4000),
            Resource::Logs => Duration::from_millis(3000),
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Resource::Stats => 0,
            Resource::Incidents => 1,
            Resource::Alerts => 2,
            Resource::Logs => 3,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single selected dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Alerts,
    Logs,
}

impl Tab {
    /// Whether the given resource is polled while this tab is selected.
    ///
    /// `stats` and `incidents` are always-on; `alerts` and `logs` only
    /// refresh while their view is visible.
    pub fn activates(&self, resource: Resource) -> bool {
        match resource {
            Resource::Stats | Resource::Incidents => true,
            Resource::Alerts => *self == Tab::Alerts,
            Resource::Logs => *self == Tab::Logs,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tab::Overview => "overview",
            Tab::Alerts => "alerts",
            Tab::Logs => "logs",
        };
        f.write_str(name)
    }
}
