//! Hardcoded default fields per exam type.
//!
//! Used when the catalog has no template for the requested subtype, when every template field
//! is blank, or when the catalog cannot be reached.

use crate::catalog::{TemplateField, TemplateSet};
use report_types::ExamType;

type FallbackField = (&'static str, &'static str, &'static [&'static str]);

const ECHOGRAPHY: &[FallbackField] = &[
    ("foie", "Foie", &["Foie de taille normale, d'échostructure homogène, sans lésion focale."]),
    ("vesicule", "Vésicule biliaire", &["Vésicule alithiasique à paroi fine."]),
    ("voies_biliaires", "Voies biliaires", &["Voies biliaires intra et extra-hépatiques non dilatées."]),
    ("pancreas", "Pancréas", &["Pancréas d'aspect normal."]),
    ("rate", "Rate", &["Rate de taille normale, homogène."]),
    ("reins", "Reins", &["Reins de taille normale, bien différenciés, sans dilatation des cavités."]),
    ("Conclusion", "Conclusion", &["Échographie abdominale sans anomalie."]),
    ("conduite_a_tenir", "Conduite à tenir", &[]),
];

const DOPPLER: &[FallbackField] = &[
    ("aorte", "Aorte abdominale", &["Aorte de calibre normal."]),
    ("iliaques", "Artères iliaques", &["Axes iliaques perméables."]),
    ("femorales", "Artères fémorales", &["Flux triphasique bilatéral."]),
    ("poplitees", "Artères poplitées", &["Flux triphasique bilatéral."]),
    ("jambieres", "Artères jambières", &["Perméables."]),
    ("Conclusion", "Conclusion", &["Absence d'anomalie hémodynamique significative."]),
];

const THYROID: &[FallbackField] = &[
    ("Indication", "Indication", &[]),
    ("Technique", "Technique", &["Échographie cervicale avec sonde linéaire haute fréquence."]),
    ("Resultats", "Résultats", &["Thyroïde de taille normale, d'échostructure homogène."]),
    ("Conclusion", "Conclusion", &["Échographie thyroïdienne normale."]),
];

const ECG: &[FallbackField] = &[
    ("Rythme", "Rythme", &["Rythme sinusal régulier."]),
    ("Frequence", "Fréquence", &[]),
    ("Axe", "Axe", &["Axe normal."]),
    ("Conduction", "Conduction", &["PR et QRS de durée normale."]),
    ("Repolarisation", "Repolarisation", &["Pas de trouble de la repolarisation."]),
    ("Conclusion", "Conclusion", &["ECG normal."]),
];

/// Returns the hardcoded default field set for `exam_type`.
pub fn fallback_templates(exam_type: ExamType) -> TemplateSet {
    let table = match exam_type {
        ExamType::Echography => ECHOGRAPHY,
        ExamType::Doppler => DOPPLER,
        ExamType::Thyroid => THYROID,
        ExamType::Ecg => ECG,
    };

    let fields = table
        .iter()
        .map(|(key, label, lines)| {
            let lines = lines.iter().map(|line| line.to_string()).collect();
            TemplateField::new(key, label, lines)
                .expect("fallback fields have non-empty keys and labels")
        })
        .collect();

    TemplateSet::new(fields).expect("fallback keys are unique and not reserved")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_exam_type_has_fallback_content() {
        for exam_type in ExamType::ALL {
            let set = fallback_templates(exam_type);
            assert!(set.has_content(), "{exam_type} fallback is blank");
            assert!(set.get("Conclusion").is_some(), "{exam_type} has no Conclusion");
        }
    }

    #[test]
    fn test_thyroid_fallback_order() {
        let set = fallback_templates(ExamType::Thyroid);
        let keys: Vec<&str> = set.fields().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["Indication", "Technique", "Resultats", "Conclusion"]);
    }
}
