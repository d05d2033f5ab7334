/// A cgroup controller this crate reads limits from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Controller {
    Memory,
    Cpu,
}

impl Controller {
    /// Kernel name of the controller as it appears in mount options and in
    /// `/proc/self/cgroup`.
    pub const fn name(self) -> &'static str {
        match self {
            Controller::Memory => "memory",
            Controller::Cpu => "cpu",
        }
    }

    /// Exact name match; `cpu` does not match `cpuacct` or `cpuset`.
    pub fn matches(self, name: &str) -> bool {
        self.name() == name
    }
}

impl std::fmt::Display for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable name of the hierarchy selected by a controller filter.
pub fn hierarchy_label(controller: Option<Controller>) -> &'static str {
    controller.map_or("unified", Controller::name)
}
