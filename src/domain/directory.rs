//! Doctor discovery: free-text search, specialization filter, sort order.

use crate::domain::Doctor;
use std::cmp::Ordering;

/// Specializations offered in the search filter. `All` disables the filter.
pub const SPECIALIZATIONS: [&str; 13] = [
    "All",
    "General Medicine",
    "Cardiology",
    "Dermatology",
    "Neurology",
    "Orthopedics",
    "Pediatrics",
    "Psychiatry",
    "Gynecology",
    "Ophthalmology",
    "Oncology",
    "Urology",
    "Endocrinology",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoctorSort {
    /// Highest rating first.
    #[default]
    Rating,
    /// Cheapest consultation first.
    Fee,
    /// Most experienced first.
    Experience,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorQuery {
    pub text: String,
    /// `None` or `Some("All")` means any specialization.
    pub specialization: Option<String>,
    pub sort: DoctorSort,
}

impl DoctorQuery {
    fn matches(&self, doctor: &Doctor) -> bool {
        let needle = self.text.trim().to_lowercase();
        let text_ok = needle.is_empty()
            || doctor.name.to_lowercase().contains(&needle)
            || doctor.specialization.to_lowercase().contains(&needle);
        let spec_ok = match self.specialization.as_deref() {
            None | Some("All") => true,
            Some(spec) => doctor.specialization == spec,
        };
        text_ok && spec_ok
    }

    fn compare(&self, a: &Doctor, b: &Doctor) -> Ordering {
        match self.sort {
            DoctorSort::Rating => b.rating.total_cmp(&a.rating),
            DoctorSort::Fee => a.consultation_fee.total_cmp(&b.consultation_fee),
            DoctorSort::Experience => b.experience_years.cmp(&a.experience_years),
        }
    }

    /// Filter then stable-sort. Equal keys keep their backend order.
    pub fn apply(&self, doctors: Vec<Doctor>) -> Vec<Doctor> {
        let mut out: Vec<Doctor> = doctors.into_iter().filter(|d| self.matches(d)).collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, spec: &str, rating: f64, fee: f64, exp: u32) -> Doctor {
        Doctor {
            id: name.to_lowercase(),
            name: name.into(),
            avatar: None,
            email: None,
            specialization: spec.into(),
            experience_years: exp,
            hospital: "Private Practice".into(),
            consultation_fee: fee,
            rating,
            is_verified: true,
        }
    }

    fn sample() -> Vec<Doctor> {
        vec![
            doc("Ada", "Cardiology", 4.2, 80.0, 12),
            doc("Bo", "Dermatology", 4.9, 50.0, 3),
            doc("Cy", "Cardiology", 4.7, 120.0, 20),
        ]
    }

    fn names(ds: &[Doctor]) -> Vec<&str> {
        ds.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn default_sorts_by_rating_desc() {
        let out = DoctorQuery::default().apply(sample());
        assert_eq!(names(&out), ["Bo", "Cy", "Ada"]);
    }

    #[test]
    fn text_matches_name_or_specialization() {
        let q = DoctorQuery {
            text: "CARDIO".into(),
            ..Default::default()
        };
        assert_eq!(names(&q.apply(sample())), ["Cy", "Ada"]);

        let q = DoctorQuery {
            text: "bo".into(),
            ..Default::default()
        };
        assert_eq!(names(&q.apply(sample())), ["Bo"]);
    }

    #[test]
    fn specialization_filter_and_other_sorts() {
        let q = DoctorQuery {
            specialization: Some("Cardiology".into()),
            sort: DoctorSort::Fee,
            ..Default::default()
        };
        assert_eq!(names(&q.apply(sample())), ["Ada", "Cy"]);

        let q = DoctorQuery {
            specialization: Some("All".into()),
            sort: DoctorSort::Experience,
            ..Default::default()
        };
        assert_eq!(names(&q.apply(sample())), ["Cy", "Ada", "Bo"]);
    }
}
