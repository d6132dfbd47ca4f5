use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub serial_id: String,
    pub room_number: i64,
    pub student_id: String,
    pub campus_id: String,
    /// Quiz, Midsem, Lab Test, Weekly Lab.
    pub component_scores: [f64; 4],
    pub compre_score: f64,
    pub stored_total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Quiz,
    Midsem,
    LabTest,
    WeeklyLab,
    PreCompre,
    Compre,
    Total,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Quiz,
        Component::Midsem,
        Component::LabTest,
        Component::WeeklyLab,
        Component::PreCompre,
        Component::Compre,
        Component::Total,
    ];

    pub const PRE_COMPRE: [Component; 4] = [
        Component::Quiz,
        Component::Midsem,
        Component::LabTest,
        Component::WeeklyLab,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Component::Quiz => "Quiz",
            Component::Midsem => "Midsem",
            Component::LabTest => "Lab Test",
            Component::WeeklyLab => "Weekly Lab",
            Component::PreCompre => "Pre-compre",
            Component::Compre => "Compre",
            Component::Total => "Total",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomFilter(Option<i64>);

impl RoomFilter {
    pub fn all() -> Self {
        RoomFilter(None)
    }

    pub fn room(number: i64) -> Self {
        RoomFilter(Some(number))
    }

    pub fn from_sentinel(value: i64) -> Self {
        if value < 0 {
            RoomFilter::all()
        } else {
            RoomFilter::room(value)
        }
    }

    pub fn admits(&self, room_number: i64) -> bool {
        self.0.map_or(true, |room| room == room_number)
    }

    pub fn room_number(&self) -> Option<i64> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscrepancyRecord {
    #[serde(rename = "error_index")]
    pub serial_id: String,
    pub expected_total: f64,
    pub actual_total: f64,
}

/// `position` indexes the input row sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub position: usize,
    pub serial_id: String,
    pub corrected_total: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentAverages {
    values: [f64; 7],
}

impl ComponentAverages {
    pub fn from_sums(sums: &ComponentSums, count: usize) -> Self {
        let mut values = [0.0; 7];
        for (value, sum) in values.iter_mut().zip(sums.values.iter()) {
            *value = crate::rounding::fixed_round(sum / count as f64, 3);
        }
        ComponentAverages { values }
    }

    pub fn get(&self, component: Component) -> f64 {
        self.values[component.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Component, f64)> + '_ {
        Component::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

impl Serialize for ComponentAverages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (component, value) in self.iter() {
            map.serialize_entry(component.title(), &value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentSums {
    values: [f64; 7],
}

impl ComponentSums {
    pub fn add(&mut self, component: Component, value: f64) {
        self.values[component.index()] += value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupAverage {
    pub average: f64,
    pub students: usize,
}

pub type GroupAverages = BTreeMap<String, GroupAverage>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranker {
    pub emplid: String,
    pub marks: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub first: Ranker,
    pub second: Ranker,
    pub third: Ranker,
}

impl Ranking {
    pub fn places(&self) -> [(&'static str, &Ranker); 3] {
        [("1st", &self.first), ("2nd", &self.second), ("3rd", &self.third)]
    }
}

impl Serialize for Ranking {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        for (place, ranker) in self.places() {
            map.serialize_entry(place, ranker)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub discrepancies: Vec<DiscrepancyRecord>,
    pub corrections: Vec<Correction>,
    pub component_averages: ComponentAverages,
    pub group_averages: GroupAverages,
    pub ranking: Ranking,
    pub included_rows: usize,
}
