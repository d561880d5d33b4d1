//! Configuration for the topology builder.
//!
//! A [`NumaConfig`] is an explicit value passed into every construction step;
//! there is no ambient global configuration. It can be loaded from YAML or
//! JSON files, or built programmatically with [`NumaConfigBuilder`].
//!
//! # Configuration File Structure
//!
//! ```yaml
//! log_level: info
//!
//! system:
//!   target_isa: alpha
//!   cpu_type: AtomicSimpleCPU
//!   mem_type: SimpleMemory
//!   cache_line_size: 64
//!   sys_clock: 1GHz
//!   cpu_clock: 2GHz
//!
//! numa:
//!   num_domains: 2
//!   num_cpus_per_domain: 2
//!   mem_size_per_domain: 512MB
//!   slice_size: 512MB
//!
//! base:
//!   mem_size: 512MB        # base range [0, mem_size) unless mem_ranges is set
//!   bridge_ranges:
//!     - start: 0x80000000000
//!       end: 0xffffffffffffffff
//!
//! boot:
//!   kernel: vmlinux
//!   command_line: "console=ttyS0"
//!   lpae: false
//!   virtualisation: false
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::range::AddrRange;
use crate::size::ByteSize;
use crate::types::{Addr, MIB};

/// Start of the Alpha I/O address space, reachable only through the bridge.
pub const ALPHA_IO_BASE: Addr = 0x800_0000_0000;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{first} and {second} are mutually exclusive")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },

    #[error("Invalid byte size: {0:?}")]
    InvalidSize(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Target instruction set architecture of the simulated machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetIsa {
    #[default]
    Alpha,
    Arm,
    Mips,
    Power,
    Riscv,
    Sparc,
    X86,
}

impl fmt::Display for TargetIsa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetIsa::Alpha => "alpha",
            TargetIsa::Arm => "arm",
            TargetIsa::Mips => "mips",
            TargetIsa::Power => "power",
            TargetIsa::Riscv => "riscv",
            TargetIsa::Sparc => "sparc",
            TargetIsa::X86 => "x86",
        };
        f.write_str(name)
    }
}

/// Machine-wide parameters consumed by the base system.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemParams {
    /// Target ISA; only Alpha full systems can be built
    #[serde(default)]
    pub target_isa: TargetIsa,

    /// Registry class used for compute units
    #[serde(default = "default_cpu_type")]
    pub cpu_type: String,

    /// Registry class used for memory controllers
    #[serde(default = "default_mem_type")]
    pub mem_type: String,

    /// Cache line size for the entire system, in bytes
    #[serde(default = "default_cache_line_size")]
    pub cache_line_size: u32,

    /// Frequency of the system clock domain
    #[serde(default = "default_sys_clock")]
    pub sys_clock: String,

    /// Frequency of the CPU clock domain
    #[serde(default = "default_cpu_clock")]
    pub cpu_clock: String,
}

fn default_cpu_type() -> String {
    "AtomicSimpleCPU".to_string()
}

fn default_mem_type() -> String {
    "SimpleMemory".to_string()
}

fn default_cache_line_size() -> u32 {
    64
}

fn default_sys_clock() -> String {
    "1GHz".to_string()
}

fn default_cpu_clock() -> String {
    "2GHz".to_string()
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            target_isa: TargetIsa::default(),
            cpu_type: default_cpu_type(),
            mem_type: default_mem_type(),
            cache_line_size: default_cache_line_size(),
            sys_clock: default_sys_clock(),
            cpu_clock: default_cpu_clock(),
        }
    }
}

/// Shape of the NUMA topology.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NumaParams {
    /// Number of NUMA domains
    #[serde(default = "default_num_domains")]
    pub num_domains: u32,

    /// Number of compute units per domain
    #[serde(default = "default_num_cpus_per_domain")]
    pub num_cpus_per_domain: u32,

    /// Size of each domain's address range
    #[serde(default = "default_domain_size")]
    pub mem_size_per_domain: ByteSize,

    /// Stride between consecutive domain base addresses
    #[serde(default = "default_domain_size")]
    pub slice_size: ByteSize,
}

fn default_num_domains() -> u32 {
    2
}

fn default_num_cpus_per_domain() -> u32 {
    2
}

fn default_domain_size() -> ByteSize {
    ByteSize::new(512 * MIB)
}

impl Default for NumaParams {
    fn default() -> Self {
        Self {
            num_domains: default_num_domains(),
            num_cpus_per_domain: default_num_cpus_per_domain(),
            mem_size_per_domain: default_domain_size(),
            slice_size: default_domain_size(),
        }
    }
}

/// Address ranges owned by the base system rather than by any domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseParams {
    /// Size of the base system's memory, mapped at address 0
    #[serde(default = "default_base_mem_size")]
    pub mem_size: ByteSize,

    /// Explicit memory ranges declared before any domain range; when unset
    /// the base system gets the single range `[0, mem_size)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_ranges: Option<Vec<AddrRange>>,

    /// Globally reserved I/O ranges reachable only via the backbone
    #[serde(default = "default_bridge_ranges")]
    pub bridge_ranges: Vec<AddrRange>,
}

fn default_base_mem_size() -> ByteSize {
    ByteSize::new(512 * MIB)
}

/// The Alpha I/O space, from [`ALPHA_IO_BASE`] to the top of the address
/// space.
///
/// Ranges are half-open, so the very last byte (`Addr::MAX`) is not covered.
fn default_bridge_ranges() -> Vec<AddrRange> {
    vec![AddrRange::new(ALPHA_IO_BASE, Addr::MAX)]
}

impl BaseParams {
    /// Memory ranges of the base system, in declared order.
    pub fn resolved_mem_ranges(&self) -> Vec<AddrRange> {
        match &self.mem_ranges {
            Some(ranges) => ranges.clone(),
            None => vec![AddrRange::new(0, self.mem_size.bytes())],
        }
    }
}

impl Default for BaseParams {
    fn default() -> Self {
        Self {
            mem_size: default_base_mem_size(),
            mem_ranges: None,
            bridge_ranges: default_bridge_ranges(),
        }
    }
}

/// Boot parameters carried through to the engine untouched, apart from the
/// kernel command line which is resolved at build time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BootConfig {
    #[serde(default)]
    pub kernel: Option<PathBuf>,

    #[serde(default)]
    pub command_line: Option<String>,

    #[serde(default)]
    pub command_line_file: Option<PathBuf>,

    #[serde(default)]
    pub script: Option<PathBuf>,

    #[serde(default)]
    pub init_param: u64,

    /// Enable large physical address extensions
    #[serde(default)]
    pub lpae: bool,

    /// Enable hardware virtualisation support
    #[serde(default)]
    pub virtualisation: bool,
}

impl BootConfig {
    /// Checks that mutually exclusive options are not both set.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.command_line.is_some() && self.command_line_file.is_some() {
            return Err(ConfigError::Conflict {
                first: "command_line",
                second: "command_line_file",
            });
        }
        Ok(())
    }

    /// Resolves the kernel command line, reading `command_line_file` if set.
    pub fn resolve_command_line(&self) -> ConfigResult<Option<String>> {
        self.validate()?;
        if let Some(line) = &self.command_line {
            return Ok(Some(line.clone()));
        }
        match &self.command_line_file {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?.trim().to_string())),
            None => Ok(None),
        }
    }
}

/// Complete topology configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NumaConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub system: SystemParams,

    #[serde(default)]
    pub numa: NumaParams,

    #[serde(default)]
    pub base: BaseParams,

    #[serde(default)]
    pub boot: BootConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NumaConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            system: SystemParams::default(),
            numa: NumaParams::default(),
            base: BaseParams::default(),
            boot: BootConfig::default(),
        }
    }
}

impl NumaConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: NumaConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: NumaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the entire configuration.
    ///
    /// A per-domain size larger than the slice size is accepted; the
    /// resulting range overlap is reported by the builder, not rejected here.
    pub fn validate(&self) -> ConfigResult<()> {
        let numa = &self.numa;
        if numa.num_domains == 0 {
            return Err(ConfigError::Validation(
                "num_domains must be at least 1".to_string(),
            ));
        }
        if numa.num_cpus_per_domain == 0 {
            return Err(ConfigError::Validation(
                "num_cpus_per_domain must be at least 1".to_string(),
            ));
        }
        if numa.mem_size_per_domain.is_zero() {
            return Err(ConfigError::Validation(
                "mem_size_per_domain must be non-zero".to_string(),
            ));
        }
        if numa.slice_size.is_zero() {
            return Err(ConfigError::Validation(
                "slice_size must be non-zero".to_string(),
            ));
        }
        if numa.num_cpus_per_domain.checked_mul(numa.num_domains).is_none() {
            return Err(ConfigError::Validation(format!(
                "{} domains of {} cpus overflow the cpu id space",
                numa.num_domains, numa.num_cpus_per_domain
            )));
        }

        if self.base.mem_ranges.is_none() && self.base.mem_size.is_zero() {
            return Err(ConfigError::Validation(
                "base mem_size must be non-zero".to_string(),
            ));
        }
        let base_ranges = self.base.resolved_mem_ranges();
        for range in base_ranges.iter().chain(&self.base.bridge_ranges) {
            if range.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Empty or inverted address range: {range}"
                )));
            }
        }

        for (name, clock) in [
            ("sys_clock", &self.system.sys_clock),
            ("cpu_clock", &self.system.cpu_clock),
        ] {
            if clock.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must be set")));
            }
        }

        if self.system.cache_line_size == 0 || !self.system.cache_line_size.is_power_of_two() {
            return Err(ConfigError::Validation(format!(
                "cache_line_size must be a power of two, got {}",
                self.system.cache_line_size
            )));
        }

        self.boot.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating a `NumaConfig` programmatically.
#[derive(Default)]
pub struct NumaConfigBuilder {
    config: NumaConfig,
}

impl NumaConfigBuilder {
    /// Creates a new builder starting from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of domains.
    pub fn num_domains(mut self, n: u32) -> Self {
        self.config.numa.num_domains = n;
        self
    }

    /// Sets the number of compute units per domain.
    pub fn num_cpus_per_domain(mut self, n: u32) -> Self {
        self.config.numa.num_cpus_per_domain = n;
        self
    }

    /// Sets the size of each domain's address range.
    pub fn mem_size_per_domain(mut self, size: impl Into<ByteSize>) -> Self {
        self.config.numa.mem_size_per_domain = size.into();
        self
    }

    /// Sets the stride between domain base addresses.
    pub fn slice_size(mut self, size: impl Into<ByteSize>) -> Self {
        self.config.numa.slice_size = size.into();
        self
    }

    /// Sets the target ISA.
    pub fn target_isa(mut self, isa: TargetIsa) -> Self {
        self.config.system.target_isa = isa;
        self
    }

    /// Sets the compute unit class.
    pub fn cpu_type(mut self, class: impl Into<String>) -> Self {
        self.config.system.cpu_type = class.into();
        self
    }

    /// Sets the memory controller class.
    pub fn mem_type(mut self, class: impl Into<String>) -> Self {
        self.config.system.mem_type = class.into();
        self
    }

    /// Sets the size of the default base-system memory range.
    pub fn base_mem_size(mut self, size: impl Into<ByteSize>) -> Self {
        self.config.base.mem_size = size.into();
        self
    }

    /// Appends an explicit base-system memory range, replacing the default
    /// `[0, mem_size)` range.
    pub fn add_base_range(mut self, range: AddrRange) -> Self {
        self.config
            .base
            .mem_ranges
            .get_or_insert_with(Vec::new)
            .push(range);
        self
    }

    /// Declares no base-system memory ranges at all.
    pub fn no_base_ranges(mut self) -> Self {
        self.config.base.mem_ranges = Some(Vec::new());
        self
    }

    /// Replaces the bridge ranges.
    pub fn bridge_ranges(mut self, ranges: Vec<AddrRange>) -> Self {
        self.config.base.bridge_ranges = ranges;
        self
    }

    /// Sets the boot configuration.
    pub fn boot(mut self, boot: BootConfig) -> Self {
        self.config.boot = boot;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<NumaConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
