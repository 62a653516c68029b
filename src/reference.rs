//! Observed reference data for the Yemen cholera outbreak.
//!
//! Cumulative suspected cases and population per governorate, with the
//! aggregate `Total` row first. These values are hand-entered and fixed.

use serde::Serialize;

/// Key of the aggregate row.
pub const TOTAL: &str = "Total";

/// One row of the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Governorate {
    /// Governorate name, as used in simulation CSV headers.
    pub name: &'static str,
    /// Observed cumulative cases.
    pub cases: u64,
    /// Population.
    pub population: u64,
    /// Bar-chart tick label (footnote markers, `\n` for wrapping).
    pub label: &'static str,
}

impl Governorate {
    const fn new(name: &'static str, cases: u64, population: u64, label: &'static str) -> Self {
        Self {
            name,
            cases,
            population,
            label,
        }
    }

    /// Observed cases as a fraction of the population.
    #[allow(clippy::cast_precision_loss)]
    pub fn observed_fraction(&self) -> f64 {
        self.cases as f64 / self.population as f64
    }
}

/// The reference table in source order.
pub const REFERENCE: [Governorate; 23] = [
    Governorate::new(TOTAL, 1_063_786, 28_177_859, TOTAL),
    Governorate::new("Ibb", 67_129, 2_837_000, "Ibb"),
    Governorate::new("Abyan", 28_243, 568_000, "Abyan**"),
    Governorate::new("Amanat Al Asimah", 103_184, 2_948_472, "Amanat\n Al Asimah"),
    Governorate::new("Al Bayda", 30_568, 760_000, "Al Bayda**"),
    Governorate::new("Taizz", 63_696, 3_182_000, "Taizz"),
    Governorate::new("Al Dhale'e", 47_136, 589_000, "Al Dhale'e**"),
    Governorate::new("Al Jawf", 16_018, 2_129_000, "Al Jawf"),
    Governorate::new("Hajjah", 121_287, 3_189_000, "Hajjah*"),
    Governorate::new("Al Hudaydah", 155_908, 1_424_036, "Al Hudaydah"),
    Governorate::new("Hadramaut", 591, 1_913_000, "Hadramaut"),
    Governorate::new("Dhamar", 103_214, 632_000, "Dhamar*"),
    Governorate::new("Shabwah", 1_399, 1_078_000, "Shabwah"),
    Governorate::new("Sa'ada", 10_706, 1_435_528, "Sa'ada"),
    Governorate::new("Sana'a", 76_250, 925_000, "Sana'a"),
    Governorate::new("Aden", 20_966, 983_000, "Aden**"),
    Governorate::new("Lahj", 24_342, 336_859, "Lahj**"),
    Governorate::new("Marib", 7_288, 695_000, "Marib"),
    Governorate::new("Al Mahwit", 62_887, 150_000, "Al Mahwit**"),
    Governorate::new("Al Maharah", 1_168, 1_052_000, "Al Maharah"),
    Governorate::new("Amran", 103_965, 720_000, "Amran*"),
    Governorate::new("Raymah", 17_841, 566_000, "Raymah"),
    Governorate::new("Socotra", 0, 64_964, "Socotra"),
];

/// Looks up a row by name.
pub fn lookup(name: &str) -> Option<&'static Governorate> {
    REFERENCE.iter().find(|g| g.name == name)
}

/// The aggregate row.
pub fn total() -> &'static Governorate {
    &REFERENCE[0]
}

/// Every governorate, excluding `Total`, in source order.
pub fn governorates() -> impl Iterator<Item = &'static Governorate> {
    REFERENCE.iter().filter(|g| g.name != TOTAL)
}

/// All keys (including `Total`) in source order.
pub fn keys() -> Vec<&'static str> {
    REFERENCE.iter().map(|g| g.name).collect()
}

/// Governorates sorted by observed cases, descending. Ties keep source order.
pub fn by_cases_desc() -> Vec<&'static Governorate> {
    let mut rows: Vec<_> = governorates().collect();
    rows.sort_by(|a, b| b.cases.cmp(&a.cases));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_first_and_not_a_governorate() {
        assert_eq!(total().name, TOTAL);
        assert_eq!(governorates().count(), 22);
        assert!(governorates().all(|g| g.name != TOTAL));
    }

    #[test]
    fn lookup_known_and_unknown() {
        assert_eq!(lookup("Aden").map(|g| g.cases), Some(20_966));
        assert!(lookup("Atlantis").is_none());
    }

    #[test]
    fn descending_order_matches_labels() {
        let labels: Vec<_> = by_cases_desc().iter().map(|g| g.label).collect();
        assert_eq!(
            labels,
            vec![
                "Al Hudaydah",
                "Hajjah*",
                "Amran*",
                "Dhamar*",
                "Amanat\n Al Asimah",
                "Sana'a",
                "Ibb",
                "Taizz",
                "Al Mahwit**",
                "Al Dhale'e**",
                "Al Bayda**",
                "Abyan**",
                "Lahj**",
                "Aden**",
                "Raymah",
                "Al Jawf",
                "Sa'ada",
                "Marib",
                "Shabwah",
                "Al Maharah",
                "Hadramaut",
                "Socotra",
            ]
        );
    }

    #[test]
    fn observed_fraction_of_socotra_is_zero() {
        let socotra = lookup("Socotra").unwrap();
        assert!(socotra.observed_fraction().abs() < f64::EPSILON);
    }
}
