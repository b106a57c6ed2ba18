//! Subject identity construction
//! Author: kartik4091
//!
//! Turns the optional fields of a signing request into the ordered list of
//! distinguished-name attributes used as both subject and issuer of the
//! self-signed certificate.

use std::fmt;

use openssl::nid::Nid;
use openssl::x509::{X509Name, X509NameBuilder};
use serde::{Deserialize, Serialize};

use crate::config::SUBJECT_COUNTRY;
use crate::error::{Error, Result};

/// Private OID carrying the taxpayer identification number (INN)
pub const TAX_ID_OID: &str = "1.2.643.3.131.1.1";

/// Private OID carrying the state registration number (OGRN)
pub const REGISTRATION_NUMBER_OID: &str = "1.2.643.100.1";

/// Certificate issuance request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignRequest {
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub title: Option<String>,
    pub organization_name: Option<String>,
    pub city: Option<String>,
    /// Accepted for compatibility, not part of the subject
    pub street_address: Option<String>,
    pub email: Option<String>,
    pub inn: Option<String>,
    pub ogrn: Option<String>,
    #[serde(flatten)]
    pub stamp: StampData,
}

/// Dynamic text drawn over the stamp image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampData {
    #[serde(rename = "stampOrganizationName")]
    pub organization_name: Option<String>,
    #[serde(rename = "stampDirector")]
    pub director: Option<String>,
    #[serde(rename = "stampInn")]
    pub inn: Option<String>,
    #[serde(rename = "stampValidityPeriod")]
    pub validity_period: Option<String>,
}

/// Distinguished-name attribute types, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Surname,
    GivenName,
    Title,
    Organization,
    Locality,
    StateOrProvince,
    Country,
    Email,
    TaxId,
    RegistrationNumber,
}

impl AttributeKind {
    /// OpenSSL short name, as printed in certificate subjects.
    pub fn short_name(self) -> &'static str {
        match self {
            AttributeKind::Surname => "SN",
            AttributeKind::GivenName => "GN",
            AttributeKind::Title => "title",
            AttributeKind::Organization => "O",
            AttributeKind::Locality => "L",
            AttributeKind::StateOrProvince => "ST",
            AttributeKind::Country => "C",
            AttributeKind::Email => "emailAddress",
            AttributeKind::TaxId => "INN",
            AttributeKind::RegistrationNumber => "OGRN",
        }
    }

    fn field(self) -> NameField {
        match self {
            AttributeKind::Surname => NameField::Nid(Nid::SURNAME),
            AttributeKind::GivenName => NameField::Nid(Nid::GIVENNAME),
            AttributeKind::Title => NameField::Nid(Nid::TITLE),
            AttributeKind::Organization => NameField::Nid(Nid::ORGANIZATIONNAME),
            AttributeKind::Locality => NameField::Nid(Nid::LOCALITYNAME),
            AttributeKind::StateOrProvince => NameField::Nid(Nid::STATEORPROVINCENAME),
            AttributeKind::Country => NameField::Nid(Nid::COUNTRYNAME),
            AttributeKind::Email => NameField::Nid(Nid::PKCS9_EMAILADDRESS),
            AttributeKind::TaxId => NameField::Oid(TAX_ID_OID),
            AttributeKind::RegistrationNumber => NameField::Oid(REGISTRATION_NUMBER_OID),
        }
    }

    fn append_to(self, builder: &mut X509NameBuilder, value: &str) -> Result<()> {
        let appended = match self.field() {
            NameField::Nid(nid) => builder.append_entry_by_nid(nid, value),
            NameField::Oid(oid) => builder.append_entry_by_text(oid, value),
        };
        appended.map_err(|e| Error::CertificateBuild(format!("Failed to set {}: {}", self.short_name(), e)))
    }
}

enum NameField {
    Nid(Nid),
    Oid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAttribute {
    pub kind: AttributeKind,
    pub value: String,
}

/// Ordered subject attributes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    attributes: Vec<IdentityAttribute>,
}

impl Identity {
    pub fn attributes(&self) -> &[IdentityAttribute] {
        &self.attributes
    }

    pub fn values_of(&self, kind: AttributeKind) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(move |a| a.kind == kind)
            .map(|a| a.value.as_str())
    }

    pub fn to_x509_name(&self) -> Result<X509Name> {
        let mut builder = X509Name::builder()
            .map_err(|e| Error::CertificateBuild(format!("Failed to create name builder: {}", e)))?;
        for attribute in &self.attributes {
            attribute.kind.append_to(&mut builder, &attribute.value)?;
        }
        Ok(builder.build())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attribute) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", attribute.kind.short_name(), attribute.value)?;
        }
        Ok(())
    }
}

/// Builds an [`Identity`] from request fields.
///
/// A field contributes only when present and non-empty. Values are not
/// trimmed or validated. The city yields both locality and state entries,
/// and the country is always emitted.
pub struct IdentityBuilder {
    attributes: Vec<IdentityAttribute>,
}

impl IdentityBuilder {
    pub fn new() -> Self {
        Self { attributes: Vec::with_capacity(10) }
    }

    pub fn from_request(request: &SignRequest) -> Identity {
        let mut builder = Self::new();
        builder
            .optional(AttributeKind::Surname, request.surname.as_deref())
            .optional(AttributeKind::GivenName, request.given_name.as_deref())
            .optional(AttributeKind::Title, request.title.as_deref())
            .optional(AttributeKind::Organization, request.organization_name.as_deref())
            .optional(AttributeKind::Locality, request.city.as_deref())
            .optional(AttributeKind::StateOrProvince, request.city.as_deref())
            .push(AttributeKind::Country, SUBJECT_COUNTRY)
            .optional(AttributeKind::Email, request.email.as_deref())
            .optional(AttributeKind::TaxId, request.inn.as_deref())
            .optional(AttributeKind::RegistrationNumber, request.ogrn.as_deref());
        builder.build()
    }

    fn optional(&mut self, kind: AttributeKind, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) if !v.is_empty() => self.push(kind, v),
            _ => self,
        }
    }

    fn push(&mut self, kind: AttributeKind, value: &str) -> &mut Self {
        self.attributes.push(IdentityAttribute { kind, value: value.to_owned() });
        self
    }

    pub fn build(self) -> Identity {
        Identity { attributes: self.attributes }
    }
}

impl Default for IdentityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(identity: &Identity) -> Vec<AttributeKind> {
        identity.attributes().iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_country_only_for_empty_request() {
        let identity = IdentityBuilder::from_request(&SignRequest::default());
        assert_eq!(kinds(&identity), vec![AttributeKind::Country]);
        assert_eq!(identity.to_string(), "C=RU");
    }

    #[test]
    fn test_full_request_order() {
        let request = SignRequest {
            surname: Some("Ivanov".into()),
            given_name: Some("Ivan".into()),
            title: Some("Director".into()),
            organization_name: Some("Romashka".into()),
            city: Some("Moscow".into()),
            email: Some("ivanov@example.ru".into()),
            inn: Some("7700000000".into()),
            ogrn: Some("1027700000000".into()),
            ..Default::default()
        };
        let identity = IdentityBuilder::from_request(&request);
        assert_eq!(
            kinds(&identity),
            vec![
                AttributeKind::Surname,
                AttributeKind::GivenName,
                AttributeKind::Title,
                AttributeKind::Organization,
                AttributeKind::Locality,
                AttributeKind::StateOrProvince,
                AttributeKind::Country,
                AttributeKind::Email,
                AttributeKind::TaxId,
                AttributeKind::RegistrationNumber,
            ]
        );
    }

    #[test]
    fn test_empty_organization_skipped_city_doubled() {
        let request = SignRequest {
            surname: Some("Ivanov".into()),
            organization_name: Some(String::new()),
            city: Some("Moscow".into()),
            ..Default::default()
        };
        let identity = IdentityBuilder::from_request(&request);
        assert_eq!(identity.to_string(), "SN=Ivanov, L=Moscow, ST=Moscow, C=RU");
        assert_eq!(identity.values_of(AttributeKind::Organization).count(), 0);
    }

    #[test]
    fn test_values_not_trimmed_or_validated() {
        let request = SignRequest {
            surname: Some(" ".into()),
            inn: Some("not-digits".into()),
            ..Default::default()
        };
        let identity = IdentityBuilder::from_request(&request);
        assert_eq!(identity.values_of(AttributeKind::Surname).collect::<Vec<_>>(), vec![" "]);
        assert_eq!(identity.values_of(AttributeKind::TaxId).collect::<Vec<_>>(), vec!["not-digits"]);
    }

    #[test]
    fn test_x509_name_uses_private_oids() {
        let request = SignRequest {
            surname: Some("Петров".into()),
            inn: Some("7700000000".into()),
            ogrn: Some("1027700000000".into()),
            ..Default::default()
        };
        let name = IdentityBuilder::from_request(&request).to_x509_name().unwrap();
        let oids: Vec<String> = name.entries().map(|e| e.object().to_string()).collect();
        assert_eq!(oids.len(), 4);
        let rendered = name
            .entries()
            .map(|e| e.data().as_utf8().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(rendered, vec!["Петров", "RU", "7700000000", "1027700000000"]);
    }

    #[test]
    fn test_display_matches_certificate_rendering() {
        let request = SignRequest {
            surname: Some("Ivanov".into()),
            given_name: Some("Ivan".into()),
            title: Some("Director".into()),
            organization_name: Some("OOO Romashka".into()),
            city: Some("Moscow".into()),
            email: Some("ivanov@example.ru".into()),
            inn: Some("7700000000".into()),
            ogrn: Some("1027700000000".into()),
            ..Default::default()
        };
        let identity = IdentityBuilder::from_request(&request);
        let name = identity.to_x509_name().unwrap();
        assert_eq!(identity.to_string(), crate::crypto::certificate::format_name(&name));
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let json = r#"{"surname":"Ivanov","givenName":"Ivan","organizationName":"","stampDirector":"Ivanov I.I."}"#;
        let request: SignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.given_name.as_deref(), Some("Ivan"));
        assert_eq!(request.stamp.director.as_deref(), Some("Ivanov I.I."));
        assert!(request.city.is_none());
    }
}
