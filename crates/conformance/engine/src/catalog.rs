//! Feature catalog: the registration table of profiles and their features.
//!
//! The catalog is constructed once and passed by reference to the resolver
//! and test planner. [`FeatureCatalog::standard`] builds the published table;
//! tests substitute their own through [`FeatureCatalog::new`].

use std::collections::{BTreeMap, BTreeSet};

use conformance_types::{FeatureName, Profile, SupportLevel};

use crate::error::{ConfigurationError, ConformanceError, ConformanceResult};

/// Core and extended features of one profile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileFeatures {
    pub core: BTreeSet<FeatureName>,
    pub extended: BTreeSet<FeatureName>,
}

impl ProfileFeatures {
    pub fn new<C, E>(core: C, extended: E) -> Self
    where
        C: IntoIterator,
        C::Item: Into<FeatureName>,
        E: IntoIterator,
        E::Item: Into<FeatureName>,
    {
        Self {
            core: core.into_iter().map(Into::into).collect(),
            extended: extended.into_iter().map(Into::into).collect(),
        }
    }

    fn level(&self, level: SupportLevel) -> &BTreeSet<FeatureName> {
        match level {
            SupportLevel::Core => &self.core,
            SupportLevel::Extended => &self.extended,
        }
    }
}

/// Immutable registry mapping each profile to its feature sets.
#[derive(Clone, Debug)]
pub struct FeatureCatalog {
    entries: BTreeMap<Profile, ProfileFeatures>,
}

impl FeatureCatalog {
    /// Build a catalog from explicit entries.
    ///
    /// A feature may not be both core and extended within one profile.
    pub fn new(entries: impl IntoIterator<Item = (Profile, ProfileFeatures)>) -> ConformanceResult<Self> {
        let entries: BTreeMap<Profile, ProfileFeatures> = entries.into_iter().collect();
        for (profile, features) in &entries {
            if let Some(feature) = features.core.intersection(&features.extended).next() {
                return Err(ConfigurationError::CatalogLevelOverlap {
                    profile: *profile,
                    feature: feature.clone(),
                }
                .into());
            }
        }
        Ok(Self { entries })
    }

    /// The published registration table, with the implicit core features of
    /// every profile merged into its core set.
    pub fn standard() -> Self {
        let entries = REGISTRATION
            .iter()
            .map(|(profile, core, extended)| {
                let mut features = ProfileFeatures::new(core.iter().copied(), extended.iter().copied());
                features
                    .core
                    .extend(implicit_core_features(*profile).iter().map(|f| FeatureName::from(*f)));
                (*profile, features)
            })
            .collect();
        Self { entries }
    }

    /// Registered profiles in canonical order.
    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        self.entries.keys().copied()
    }

    /// Features of `profile` at `level`.
    pub fn features_for(
        &self,
        profile: Profile,
        level: SupportLevel,
    ) -> ConformanceResult<&BTreeSet<FeatureName>> {
        self.entry(profile).map(|e| e.level(level))
    }

    /// Whether `name` is a core or extended feature of `profile`.
    pub fn is_known_feature(&self, profile: Profile, name: &FeatureName) -> bool {
        self.level_of(profile, name).is_some()
    }

    /// Support level of `name` within `profile`.
    pub fn level_of(&self, profile: Profile, name: &FeatureName) -> Option<SupportLevel> {
        let entry = self.entries.get(&profile)?;
        if entry.core.contains(name) {
            Some(SupportLevel::Core)
        } else if entry.extended.contains(name) {
            Some(SupportLevel::Extended)
        } else {
            None
        }
    }

    fn entry(&self, profile: Profile) -> ConformanceResult<&ProfileFeatures> {
        self.entries
            .get(&profile)
            .ok_or(ConformanceError::UnknownProfile(profile))
    }
}

/// Shared base resources exercised by every test of a profile.
///
/// Every route type attaches to a Gateway of some GatewayClass, so those are
/// core everywhere. Profiles whose routes may reference backends across
/// namespaces additionally depend on ReferenceGrant.
pub fn implicit_core_features(profile: Profile) -> &'static [&'static str] {
    match profile {
        Profile::Http | Profile::Grpc | Profile::TlsPassthrough => {
            &["Gateway", "GatewayClass", "ReferenceGrant"]
        }
        Profile::Tcp | Profile::Udp => &["Gateway", "GatewayClass"],
    }
}

type Registration = (Profile, &'static [&'static str], &'static [&'static str]);

const REGISTRATION: &[Registration] = &[
    (
        Profile::Http,
        &["HTTPRoute"],
        &[
            "GatewayHTTPListenerIsolation",
            "GatewayPort8080",
            "GatewayStaticAddresses",
            "HTTPRouteBackendProtocolH2C",
            "HTTPRouteBackendProtocolWebSocket",
            "HTTPRouteBackendRequestHeaderModification",
            "HTTPRouteBackendTimeout",
            "HTTPRouteDestinationPortMatching",
            "HTTPRouteHostRewrite",
            "HTTPRouteMethodMatching",
            "HTTPRouteParentRefPort",
            "HTTPRoutePathRedirect",
            "HTTPRoutePathRewrite",
            "HTTPRoutePortRedirect",
            "HTTPRouteQueryParamMatching",
            "HTTPRouteRequestMirror",
            "HTTPRouteRequestMultipleMirrors",
            "HTTPRouteRequestTimeout",
            "HTTPRouteResponseHeaderModification",
            "HTTPRouteSchemeRedirect",
        ],
    ),
    (
        Profile::Grpc,
        &["GRPCRoute"],
        &["GRPCRouteListenerHostnameMatching"],
    ),
    (
        Profile::TlsPassthrough,
        &["TLSRoute"],
        &["TLSRouteListenerHostnameMatching"],
    ),
    (Profile::Tcp, &["TCPRoute"], &["TCPRouteMultipleListeners"]),
    (Profile::Udp, &["UDPRoute"], &[]),
];
