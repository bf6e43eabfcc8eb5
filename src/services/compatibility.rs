//! Build compatibility checks.
//!
//! A product's component kind comes from its category lineage: the nearest
//! category whose name matches a known kind wins, so "Desktop CPUs" under
//! "Processors" is a CPU. Rules that need a spec the product does not carry
//! are skipped rather than failed.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::BuildConfig;
use crate::database::models::{NewBuildItem, ProductFacts};
use crate::services::forest::{CategoryForest, ForestError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Cpu,
    Motherboard,
    Memory,
    Gpu,
    Storage,
    Psu,
    Case,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::Cpu,
        ComponentKind::Motherboard,
        ComponentKind::Memory,
        ComponentKind::Gpu,
        ComponentKind::Storage,
        ComponentKind::Psu,
        ComponentKind::Case,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            ComponentKind::Cpu => &["cpu", "processor"],
            ComponentKind::Motherboard => &["motherboard", "mainboard"],
            ComponentKind::Memory => &["memory", "ram", "memorymodule"],
            ComponentKind::Gpu => &["gpu", "graphicscard", "videocard"],
            ComponentKind::Storage => &["storage", "ssd", "hdd", "harddrive"],
            ComponentKind::Psu => &["psu", "powersupply", "powersupplyunit"],
            ComponentKind::Case => &["case", "pccase", "chassis", "computercase"],
        }
    }

    /// Matches a category name such as "Graphics Cards" or "power-supply".
    pub fn from_category_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let singular = match normalized.strip_suffix("ies") {
            Some(stem) => format!("{}y", stem),
            None => normalized.strip_suffix('s').unwrap_or(&normalized).to_string(),
        };

        Self::ALL.into_iter().find(|kind| {
            kind.aliases()
                .iter()
                .any(|alias| *alias == normalized || *alias == singular)
        })
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComponentKind::Cpu => "CPU",
            ComponentKind::Motherboard => "motherboard",
            ComponentKind::Memory => "memory module",
            ComponentKind::Gpu => "graphics card",
            ComponentKind::Storage => "storage drive",
            ComponentKind::Psu => "power supply",
            ComponentKind::Case => "case",
        };
        f.write_str(label)
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_category_name(s).ok_or_else(|| format!("unknown component kind: {}", s))
    }
}

/// Read-only snapshot the validator works against: the products referenced
/// by the candidate items and the whole category forest.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<i32, ProductFacts>,
    forest: CategoryForest,
}

impl Catalog {
    pub fn new(products: Vec<ProductFacts>, forest: CategoryForest) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.product_id, p)).collect(),
            forest,
        }
    }

    pub fn product(&self, product_id: i32) -> Option<&ProductFacts> {
        self.products.get(&product_id)
    }

    pub fn forest(&self) -> &CategoryForest {
        &self.forest
    }

    pub fn kind_of(&self, product: &ProductFacts) -> Result<Option<ComponentKind>, ForestError> {
        if !self.forest.contains(product.category_id) {
            return Ok(ComponentKind::from_category_name(&product.category_name));
        }
        let lineage = self.forest.lineage(product.category_id)?;
        Ok(lineage
            .into_iter()
            .find_map(|category| ComponentKind::from_category_name(&category.name)))
    }
}

#[derive(Debug, Clone)]
pub struct CompatibilityRules {
    pub max_quantity: HashMap<ComponentKind, i32>,
    pub required: Vec<ComponentKind>,
    pub psu_headroom: f64,
    pub base_wattage: f64,
    pub memory_module_wattage: f64,
}

impl Default for CompatibilityRules {
    fn default() -> Self {
        Self {
            max_quantity: HashMap::from([
                (ComponentKind::Cpu, 1),
                (ComponentKind::Motherboard, 1),
                (ComponentKind::Psu, 1),
                (ComponentKind::Case, 1),
            ]),
            required: Vec::new(),
            psu_headroom: 1.2,
            base_wattage: 50.0,
            memory_module_wattage: 10.0,
        }
    }
}

impl CompatibilityRules {
    pub fn from_config(config: &BuildConfig) -> Self {
        let required = config
            .required_components
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::warn!("Ignoring required component: {}", e);
                    None
                }
            })
            .collect();

        Self {
            required,
            psu_headroom: config.psu_headroom,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub is_compatible: bool,
    pub message: String,
    pub issues: Vec<String>,
}

impl Verdict {
    fn from_issues(issues: Vec<String>) -> Self {
        if issues.is_empty() {
            Self {
                is_compatible: true,
                message: "build is compatible".to_string(),
                issues,
            }
        } else {
            Self {
                is_compatible: false,
                message: issues.join("; "),
                issues,
            }
        }
    }
}

struct Part<'a> {
    product: &'a ProductFacts,
    quantity: i32,
}

/// Checks a candidate item list. Only a corrupted category forest is an
/// error; every domain problem lands in the verdict.
pub fn validate(
    items: &[NewBuildItem],
    catalog: &Catalog,
    rules: &CompatibilityRules,
) -> Result<Verdict, ForestError> {
    let mut issues = Vec::new();
    let mut parts: HashMap<ComponentKind, Vec<Part<'_>>> = HashMap::new();

    for item in items {
        let Some(product) = catalog.product(item.product_id) else {
            issues.push(format!("product {} does not exist", item.product_id));
            continue;
        };
        if product.price.is_none() {
            issues.push(format!("{} is not available for sale", product.name));
        }
        if let Some(stock) = product.stock_quantity {
            if stock < item.quantity {
                issues.push(format!(
                    "insufficient stock for {}: requested {}, available {}",
                    product.name, item.quantity, stock
                ));
            }
        }
        if let Some(kind) = catalog.kind_of(product)? {
            parts.entry(kind).or_default().push(Part {
                product,
                quantity: item.quantity,
            });
        }
    }

    check_counts(&parts, rules, &mut issues);
    check_sockets(&parts, &mut issues);
    check_memory(&parts, &mut issues);
    check_power(&parts, rules, &mut issues);
    check_case(&parts, &mut issues);

    Ok(Verdict::from_issues(issues))
}

fn of_kind<'p, 'a>(parts: &'p HashMap<ComponentKind, Vec<Part<'a>>>, kind: ComponentKind) -> &'p [Part<'a>] {
    parts.get(&kind).map(Vec::as_slice).unwrap_or(&[])
}

fn same(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn check_counts(parts: &HashMap<ComponentKind, Vec<Part<'_>>>, rules: &CompatibilityRules, issues: &mut Vec<String>) {
    for kind in ComponentKind::ALL {
        let count: i64 = of_kind(parts, kind).iter().map(|p| i64::from(p.quantity)).sum();
        if let Some(&max) = rules.max_quantity.get(&kind) {
            if count > i64::from(max) {
                issues.push(format!("a build can contain at most {} {} (found {})", max, kind, count));
            }
        }
        if count == 0 && rules.required.contains(&kind) {
            issues.push(format!("build is missing a required {}", kind));
        }
    }
}

fn check_sockets(parts: &HashMap<ComponentKind, Vec<Part<'_>>>, issues: &mut Vec<String>) {
    for cpu in of_kind(parts, ComponentKind::Cpu) {
        let Some(cpu_socket) = cpu.product.spec("socket") else { continue };
        for board in of_kind(parts, ComponentKind::Motherboard) {
            let Some(board_socket) = board.product.spec("socket") else { continue };
            if !same(cpu_socket, board_socket) {
                issues.push(format!(
                    "CPU socket {} is not compatible with motherboard socket {}",
                    cpu_socket, board_socket
                ));
            }
        }
    }
}

fn check_memory(parts: &HashMap<ComponentKind, Vec<Part<'_>>>, issues: &mut Vec<String>) {
    let hosts: Vec<&ProductFacts> = of_kind(parts, ComponentKind::Cpu)
        .iter()
        .chain(of_kind(parts, ComponentKind::Motherboard))
        .map(|p| p.product)
        .collect();

    for module in of_kind(parts, ComponentKind::Memory) {
        let Some(memory_type) = module.product.spec("memory_type") else { continue };
        let supported = hosts.iter().all(|host| match host.spec("memory_type") {
            Some(accepted) => accepted.split('/').any(|t| same(t, memory_type)),
            None => true,
        });
        if !supported {
            issues.push(format!(
                "Memory type {} is not compatible with selected CPU and motherboard",
                memory_type
            ));
        }
    }
}

fn check_power(parts: &HashMap<ComponentKind, Vec<Part<'_>>>, rules: &CompatibilityRules, issues: &mut Vec<String>) {
    let draw_of = |kind: ComponentKind, spec: &str| -> f64 {
        of_kind(parts, kind)
            .iter()
            .map(|p| p.product.spec_number(spec).unwrap_or(0.0) * f64::from(p.quantity))
            .sum()
    };

    let memory_modules: f64 = of_kind(parts, ComponentKind::Memory)
        .iter()
        .map(|p| f64::from(p.quantity))
        .sum();
    let estimated = rules.base_wattage
        + draw_of(ComponentKind::Cpu, "tdp")
        + draw_of(ComponentKind::Gpu, "power_requirement")
        + rules.memory_module_wattage * memory_modules;
    let recommended = estimated * rules.psu_headroom;

    for psu in of_kind(parts, ComponentKind::Psu) {
        let Some(wattage) = psu.product.spec_number("wattage") else { continue };
        if wattage < recommended {
            issues.push(format!(
                "Power supply ({}W) is insufficient. Recommended: {}W or higher",
                wattage,
                recommended.ceil()
            ));
        }
    }
}

fn check_case(parts: &HashMap<ComponentKind, Vec<Part<'_>>>, issues: &mut Vec<String>) {
    for case in of_kind(parts, ComponentKind::Case) {
        if let Some(max_length) = case.product.spec_number("max_gpu_length") {
            for gpu in of_kind(parts, ComponentKind::Gpu) {
                let Some(length) = gpu.product.spec_number("length") else { continue };
                if length > max_length {
                    issues.push(format!(
                        "Graphics card ({}mm) is too long for the selected case (max: {}mm)",
                        length, max_length
                    ));
                }
            }
        }

        if let Some(case_form) = case.product.spec("form_factor") {
            for board in of_kind(parts, ComponentKind::Motherboard) {
                let Some(board_form) = board.product.spec("form_factor") else { continue };
                if !same(board_form, case_form) {
                    issues.push(format!(
                        "Motherboard form factor ({}) is not compatible with case ({})",
                        board_form, case_form
                    ));
                }
            }
        }
    }
}
