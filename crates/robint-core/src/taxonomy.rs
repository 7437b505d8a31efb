//! Reference data: sectors, dimensions, companies, technologies, and the
//! built-in seed catalog.
//!
//! Reference rows are long-lived, keyed by unique name, and created at seed
//! time or by explicit admin action. The seed constants below are the robotics
//! industry taxonomy the store ships with; seeding is idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::point::ValueKind;

// ─── Reference entities ──────────────────────────────────────────────────────

/// A top-level industry category. Owns zero or more subcategories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
  pub name:          String,
  pub description:   Option<String>,
  pub subcategories: Vec<String>,
  pub created_at:    DateTime<Utc>,
}

/// A named, typed metric shared across sectors — never owned by one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
  pub name:        String,
  pub unit:        Option<String>,
  pub kind:        ValueKind,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::IntelStore::add_dimension`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDimension {
  pub name:        String,
  pub unit:        Option<String>,
  pub kind:        ValueKind,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub name:        String,
  /// Primary sector, when the company is clearly attributable to one.
  pub sector:      Option<String>,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
  pub name:        String,
  pub sector:      Option<String>,
  pub description: Option<String>,
}

/// How far along the adoption curve a technology is.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Maturity {
  Emerging,
  #[default]
  Growing,
  Mature,
}

impl Maturity {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Emerging => "emerging",
      Self::Growing => "growing",
      Self::Mature => "mature",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "emerging" => Some(Self::Emerging),
      "growing" => Some(Self::Growing),
      "mature" => Some(Self::Mature),
      _ => None,
    }
  }
}

/// A cross-cutting technology tracked independently of any sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technology {
  pub name:        String,
  pub category:    String,
  pub maturity:    Maturity,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTechnology {
  pub name:        String,
  pub category:    String,
  pub maturity:    Maturity,
  pub description: Option<String>,
}

// ─── Seed catalog ────────────────────────────────────────────────────────────

pub struct SectorSeed {
  pub name:          &'static str,
  pub description:   &'static str,
  pub subcategories: &'static [&'static str],
}

pub struct DimensionSeed {
  pub name:        &'static str,
  pub unit:        &'static str,
  pub kind:        ValueKind,
  pub description: &'static str,
}

pub struct TechnologySeed {
  pub name:        &'static str,
  pub category:    &'static str,
  pub maturity:    Maturity,
  pub description: &'static str,
}

pub const DEFAULT_SECTORS: &[SectorSeed] = &[
  SectorSeed {
    name:          "Industrial Robotics",
    description:   "Manufacturing and industrial automation robots",
    subcategories: &[
      "Articulated Robots",
      "SCARA Robots",
      "Delta Robots",
      "Cartesian Robots",
      "Collaborative Robots (Cobots)",
    ],
  },
  SectorSeed {
    name:          "Mobile Robotics",
    description:   "Autonomous mobile robots and vehicles",
    subcategories: &[
      "Autonomous Mobile Robots (AMR)",
      "Automated Guided Vehicles (AGV)",
      "Autonomous Delivery Robots",
      "Drones/UAVs",
    ],
  },
  SectorSeed {
    name:          "Service Robotics",
    description:   "Robots for service and consumer applications",
    subcategories: &[
      "Healthcare Robots",
      "Hospitality Robots",
      "Cleaning Robots",
      "Security Robots",
      "Personal/Consumer Robots",
    ],
  },
  SectorSeed {
    name:          "Agricultural Robotics",
    description:   "Robots for farming and agriculture",
    subcategories: &[
      "Harvesting Robots",
      "Weeding Robots",
      "Planting Robots",
      "Livestock Robots",
      "Crop Monitoring Drones",
    ],
  },
  SectorSeed {
    name:          "Logistics Robotics",
    description:   "Warehouse and supply chain automation",
    subcategories: &[
      "Pick and Place Robots",
      "Sorting Robots",
      "Palletizing Robots",
      "Inventory Robots",
      "Last-Mile Delivery",
    ],
  },
  SectorSeed {
    name:          "Construction Robotics",
    description:   "Robots for construction and building",
    subcategories: &[
      "Bricklaying Robots",
      "3D Printing Robots",
      "Demolition Robots",
      "Inspection Robots",
      "Exoskeletons",
    ],
  },
];

pub const DEFAULT_DIMENSIONS: &[DimensionSeed] = &[
  DimensionSeed {
    name:        "market_size",
    unit:        "USD billions",
    kind:        ValueKind::Numeric,
    description: "Total addressable market size",
  },
  DimensionSeed {
    name:        "market_growth_rate",
    unit:        "percent",
    kind:        ValueKind::Numeric,
    description: "Year-over-year growth rate",
  },
  DimensionSeed {
    name:        "unit_shipments",
    unit:        "units",
    kind:        ValueKind::Numeric,
    description: "Number of units shipped",
  },
  DimensionSeed {
    name:        "average_selling_price",
    unit:        "USD",
    kind:        ValueKind::Numeric,
    description: "Average unit price",
  },
  DimensionSeed {
    name:        "deployment_count",
    unit:        "units",
    kind:        ValueKind::Numeric,
    description: "Installed base / deployments",
  },
  DimensionSeed {
    name:        "roi_payback_period",
    unit:        "months",
    kind:        ValueKind::Numeric,
    description: "Typical ROI payback period",
  },
  DimensionSeed {
    name:        "labor_productivity_gain",
    unit:        "percent",
    kind:        ValueKind::Numeric,
    description: "Productivity improvement",
  },
  DimensionSeed {
    name:        "adoption_rate",
    unit:        "percent",
    kind:        ValueKind::Numeric,
    description: "Market penetration rate",
  },
  DimensionSeed {
    name:        "funding_raised",
    unit:        "USD millions",
    kind:        ValueKind::Numeric,
    description: "VC/investment funding",
  },
  DimensionSeed {
    name:        "employee_count",
    unit:        "employees",
    kind:        ValueKind::Numeric,
    description: "Company workforce size",
  },
];

pub const DEFAULT_TECHNOLOGIES: &[TechnologySeed] = &[
  TechnologySeed {
    name:        "Lidar",
    category:    "perception",
    maturity:    Maturity::Mature,
    description: "Laser ranging for 3D environment perception",
  },
  TechnologySeed {
    name:        "Computer Vision",
    category:    "perception",
    maturity:    Maturity::Mature,
    description: "Camera-based object detection and scene understanding",
  },
  TechnologySeed {
    name:        "SLAM",
    category:    "navigation",
    maturity:    Maturity::Mature,
    description: "Simultaneous localisation and mapping",
  },
  TechnologySeed {
    name:        "Force-Torque Sensing",
    category:    "manipulation",
    maturity:    Maturity::Growing,
    description: "Compliant grasping and contact-rich manipulation",
  },
  TechnologySeed {
    name:        "Reinforcement Learning",
    category:    "ai_software",
    maturity:    Maturity::Emerging,
    description: "Learned control policies for robot behaviour",
  },
  TechnologySeed {
    name:        "Functional Safety Systems",
    category:    "safety",
    maturity:    Maturity::Growing,
    description: "Certified safeguarding for human-robot collaboration",
  },
  TechnologySeed {
    name:        "5G Connectivity",
    category:    "connectivity",
    maturity:    Maturity::Growing,
    description: "Low-latency fleet coordination and teleoperation",
  },
  TechnologySeed {
    name:        "Solid-State Batteries",
    category:    "power",
    maturity:    Maturity::Emerging,
    description: "Higher-density power for mobile platforms",
  },
];
