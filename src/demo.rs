//! Built-in sample programme used by the `demo` command and in tests

use crate::ilo::IloAnalyzer;
use crate::programme::{CourseData, DegreeType, ProgrammeData};

pub const SAMPLE_URL: &str = "https://www.uia.no/en/studieplaner/programme/MAOKOam";

const SAMPLE_ILOS: [&str; 9] = [
    "Possess advanced knowledge about economic theory and its application to economic phenomena in the business sector.",
    "Have a sound basis for understanding value creation and financial decision-making in companies.",
    "Understand the relationship between various functions in a company.",
    "Work independently with the subject matter based on different types of sources, which they are able to analyse critically.",
    "Contribute in challenging situations that require analysis, reflection and the making of professional decisions.",
    "Can communicate and discuss viewpoints and results of scientific work with specialists and in a forum that is open to non-specialists.",
    "Can plan and lead the execution of various projects, both as a participant and as a leader.",
    "Can work at an advanced level with empirical data from both qualitative and quantitative research.",
    "The students can work independently and together with others.",
];

const SAMPLE_COURSES: [(&str, f32); 7] = [
    ("Financial Management", 7.5),
    ("Corporate Finance", 7.5),
    ("Investment Analysis", 7.5),
    ("Financial Econometrics", 7.5),
    ("Derivatives", 7.5),
    ("Asset Pricing", 7.5),
    ("Master Thesis", 30.0),
];

/// The UiA MSc Finance programme with nine outcomes and seven courses
pub fn sample_programme() -> ProgrammeData {
    let analyzer = IloAnalyzer::new();
    let mut programme = ProgrammeData::new(
        "University of Agder (UiA)",
        "MSc in Business Administration - Finance",
        SAMPLE_URL,
    );
    programme.degree_type = Some(DegreeType::Msc);
    programme.duration_months = Some(24);
    programme.total_ects = Some(120);
    programme.delivery_mode = Some("Full-time".to_string());
    programme.languages_of_instruction = vec!["English".to_string()];
    programme.urls_scraped = vec![SAMPLE_URL.to_string()];
    programme.programme_ilos = SAMPLE_ILOS
        .iter()
        .map(|text| analyzer.analyze(text, "en"))
        .collect();
    programme.courses = SAMPLE_COURSES
        .iter()
        .map(|(title, ects)| CourseData::new(*title).with_ects(*ects))
        .collect();
    programme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::analyze_gaps;
    use crate::pillar::Pillar;

    #[test]
    fn test_sample_programme_analysis() {
        let programme = sample_programme();
        assert!(programme.validate().is_ok());

        let result = analyze_gaps(&programme).unwrap();
        assert_eq!(result.ilo_count, 9);
        assert_eq!(result.ilo_weak_verb_count, 3);
        assert_eq!(result.courses_total, 7);
        assert_eq!(result.courses_with_ilos, 0);
        assert!(result.missing_pillars.contains(&Pillar::Ers));
        assert!(!result.eligibility_pass);
        // ERS 20, three pillars 15, two ILO issues 6, two structure issues 10, documentation 10
        assert_eq!(result.readiness_score, 39);
        assert_eq!(result.estimated_fix_months, 12);
    }
}
