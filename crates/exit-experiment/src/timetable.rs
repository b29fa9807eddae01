//! Campus timetable configuration.
//!
//! The timetable declares the classroom roster, the weekly grid of
//! (day, slot) cells, and the shared-corridor capacity. Cells are iterated in
//! declared order by the campaign driver; the structure carries no schedule
//! semantics of its own beyond validation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use bottleneck_kernel::Agent;

/// Full campaign configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    /// Corridor throughput baseline in students per minute.
    pub bottleneck_capacity: u32,
    /// Number of weeks the campaign repeats the weekly grid.
    pub weeks: u32,
    /// Classroom roster; order fixes fairness-queue seeding order.
    pub classrooms: Vec<ClassroomSpec>,
    /// Days in schedule order.
    pub days: Vec<DaySchedule>,
}

/// One classroom and its attendance headcount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomSpec {
    pub name: String,
    pub attendance: u32,
}

/// One day's slots in schedule order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub name: String,
    pub slots: Vec<SlotSchedule>,
}

/// One dismissal slot and the classrooms scheduled to end in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSchedule {
    /// Slot label, e.g. "10:00".
    pub label: String,
    pub classrooms: Vec<String>,
}

impl Timetable {
    /// Load and validate a timetable from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading timetable {}", path.display()))?;
        let timetable: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing timetable {}", path.display()))?;
        timetable.validate()?;
        Ok(timetable)
    }

    /// The built-in campus: five classrooms over a three-day week.
    pub fn campus_default() -> Self {
        let slot = |label: &str, rooms: &[&str]| SlotSchedule {
            label: label.to_string(),
            classrooms: rooms.iter().map(|r| r.to_string()).collect(),
        };
        Self {
            bottleneck_capacity: 100,
            weeks: 2,
            classrooms: vec![
                ClassroomSpec {
                    name: "C1".to_string(),
                    attendance: 120,
                },
                ClassroomSpec {
                    name: "C2".to_string(),
                    attendance: 80,
                },
                ClassroomSpec {
                    name: "C3".to_string(),
                    attendance: 90,
                },
                ClassroomSpec {
                    name: "C4".to_string(),
                    attendance: 60,
                },
                ClassroomSpec {
                    name: "C5".to_string(),
                    attendance: 100,
                },
            ],
            days: vec![
                DaySchedule {
                    name: "Monday".to_string(),
                    slots: vec![
                        slot("10:00", &["C4", "C5"]),
                        slot("11:00", &["C1", "C2", "C3"]),
                    ],
                },
                DaySchedule {
                    name: "Tuesday".to_string(),
                    slots: vec![
                        slot("10:00", &["C2", "C3", "C5"]),
                        slot("11:00", &["C1", "C4"]),
                    ],
                },
                DaySchedule {
                    name: "Wednesday".to_string(),
                    slots: vec![slot("11:00", &["C2", "C3", "C4", "C5"])],
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bottleneck_capacity == 0 {
            bail!("bottleneck_capacity must be positive");
        }
        if self.weeks == 0 {
            bail!("weeks must be at least 1");
        }
        if self.classrooms.is_empty() {
            bail!("timetable declares no classrooms");
        }
        let mut names = HashSet::new();
        for room in &self.classrooms {
            if room.attendance == 0 {
                bail!("classroom {} has zero attendance", room.name);
            }
            if !names.insert(room.name.as_str()) {
                bail!("duplicate classroom {}", room.name);
            }
        }
        for day in &self.days {
            if day.slots.is_empty() {
                bail!("day {} has no slots", day.name);
            }
            for slot in &day.slots {
                if slot.classrooms.is_empty() {
                    bail!("slot {} {} has no classrooms", day.name, slot.label);
                }
                for room in &slot.classrooms {
                    if !names.contains(room.as_str()) {
                        bail!(
                            "slot {} {} references unknown classroom {room}",
                            day.name,
                            slot.label
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// The full roster as kernel agents, in declared order.
    pub fn roster(&self) -> Vec<Agent> {
        self.classrooms
            .iter()
            .map(|c| Agent::classroom(&c.name, c.attendance))
            .collect()
    }

    /// The agents scheduled to dismiss in a given cell, in roster order.
    pub fn agents_in_slot(&self, slot: &SlotSchedule) -> Vec<Agent> {
        self.classrooms
            .iter()
            .filter(|c| slot.classrooms.iter().any(|name| name == &c.name))
            .map(|c| Agent::classroom(&c.name, c.attendance))
            .collect()
    }

    /// Total (day, slot) cells in one week.
    pub fn cells_per_week(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }
}
