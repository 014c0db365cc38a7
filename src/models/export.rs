// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! CSV and vCard string templating for admin exports and card downloads.

use crate::models::Profile;

/// CSV header row (Slovak, matches what event organizers expect).
const CSV_HEADERS: [&str; 8] = [
    "Celé meno",
    "Spoločnosť",
    "Pozícia",
    "E-mail",
    "Telefón",
    "LinkedIn",
    "O mne",
    "Dátum vytvorenia",
];

/// Quote a CSV field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render all profiles as a CSV document.
pub fn profiles_csv(profiles: &[Profile]) -> String {
    let mut lines = Vec::with_capacity(profiles.len() + 1);
    lines.push(CSV_HEADERS.map(csv_field).join(","));

    for profile in profiles {
        let row = [
            profile.full_name(),
            profile.company.clone().unwrap_or_default(),
            profile.position.clone().unwrap_or_default(),
            profile.email.clone(),
            profile.phone.clone().unwrap_or_default(),
            profile.linkedin_url.clone().unwrap_or_default(),
            profile.about.clone().unwrap_or_default(),
            profile.created_at.clone(),
        ];
        lines.push(row.map(|field| csv_field(&field)).join(","));
    }

    lines.join("\n")
}

/// Escape a vCard text value (RFC 2426 §5): backslash, semicolon, comma and
/// line breaks would otherwise terminate or split the property.
fn vcard_field(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\r', "")
        .replace('\n', "\\n")
}

/// Render a single profile as a vCard 3.0.
pub fn profile_vcard(profile: &Profile) -> String {
    let full_name = vcard_field(&profile.full_name());
    format!(
        "BEGIN:VCARD\r\n\
         VERSION:3.0\r\n\
         FN:{full_name}\r\n\
         N:{full_name};;;\r\n\
         ORG:{}\r\n\
         TITLE:{}\r\n\
         TEL:{}\r\n\
         EMAIL:{}\r\n\
         URL:{}\r\n\
         NOTE:{}\r\n\
         END:VCARD",
        vcard_field(profile.company.as_deref().unwrap_or("")),
        vcard_field(profile.position.as_deref().unwrap_or("")),
        vcard_field(profile.phone.as_deref().unwrap_or("")),
        vcard_field(&profile.email),
        vcard_field(profile.linkedin_url.as_deref().unwrap_or("")),
        vcard_field(profile.about.as_deref().unwrap_or("")),
    )
}

/// Render all profiles as a concatenated vCard export.
pub fn profiles_vcards(profiles: &[Profile]) -> String {
    profiles
        .iter()
        .map(profile_vcard)
        .collect::<Vec<_>>()
        .join("\r\n\r\n")
}

/// Downloadable filename for a single card, e.g. `Jana_Novakova_Acme.vcf`.
pub fn vcard_filename(profile: &Profile) -> String {
    let base = format!(
        "{}_{}",
        profile.full_name().replace(' ', "_"),
        profile.company.as_deref().unwrap_or("vizitka").replace(' ', "_")
    );
    format!("{base}.vcf")
}
