use crate::assets::descriptor::AssetDescriptor;

/// One file belonging to a built-in model family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyAsset {
    /// Path relative to the model host
    pub path: &'static str,
    pub sha256: Option<&'static str>,
}

impl FamilyAsset {
    #[must_use]
    pub fn url(&self) -> String {
        format!("{MODEL_BASE_URL}/{}", self.path)
    }
}

/// A set of assets a sample model wrapper needs before it can load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFamily {
    pub name: &'static str,
    pub subfolder: &'static str,
    pub description: &'static str,
    pub assets: &'static [FamilyAsset],
}

const MODEL_BASE_URL: &str = "https://github.com/emgucv/models/raw/master";

/// Registry of built-in model families
///
/// The host publishes no digests for these files, so none are pinned here;
/// declare `sha256` in an asset list to enforce integrity.
pub const FAMILIES: &[ModelFamily] = &[
    ModelFamily {
        name: "inception",
        subfolder: "Inception",
        description: "Inception v5 image classifier (frozen graph + labels)",
        assets: &[
            FamilyAsset {
                path: "inception/tensorflow_inception_graph.pb",
                sha256: None,
            },
            FamilyAsset {
                path: "inception/imagenet_comp_graph_label_strings.txt",
                sha256: None,
            },
        ],
    },
    ModelFamily {
        name: "resnet",
        subfolder: "Resnet",
        description: "Resnet 50 image classifier (saved model + labels)",
        assets: &[
            FamilyAsset {
                path: "resnet/resnet_50_classification_1.zip",
                sha256: None,
            },
            FamilyAsset {
                path: "resnet/ImageNetLabels.txt",
                sha256: None,
            },
        ],
    },
    ModelFamily {
        name: "multibox",
        subfolder: "Multibox",
        description: "Multibox person detector (frozen graph + location priors)",
        assets: &[
            FamilyAsset {
                path: "multibox/multibox_model.pb",
                sha256: None,
            },
            FamilyAsset {
                path: "multibox/multibox_location_priors.txt",
                sha256: None,
            },
        ],
    },
];

impl ModelFamily {
    /// Find family by name (case-insensitive)
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        FAMILIES.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Get all family names
    #[must_use]
    pub fn all_names() -> Vec<&'static str> {
        FAMILIES.iter().map(|f| f.name).collect()
    }

    /// Descriptors for every asset of the family, in declaration order
    #[must_use]
    pub fn descriptors(&self) -> Vec<AssetDescriptor> {
        self.assets
            .iter()
            .map(|asset| {
                let descriptor = AssetDescriptor::new(asset.url(), self.subfolder);
                match asset.sha256 {
                    Some(sha) => descriptor.with_checksum(sha),
                    None => descriptor,
                }
            })
            .collect()
    }

    /// Find closest match using Levenshtein distance
    #[must_use]
    pub fn suggest(name: &str) -> Option<&'static str> {
        if name.is_empty() {
            return None;
        }

        let name = name.to_ascii_lowercase();
        FAMILIES
            .iter()
            .map(|f| (f.name, levenshtein_distance(&name, f.name)))
            .min_by_key(|(_, dist)| *dist)
            .filter(|(_, dist)| *dist <= 2) // Only suggest if within 2 edits
            .map(|(family_name, _)| family_name)
    }
}

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s2_chars: Vec<char> = s2.chars().collect();
    let mut previous: Vec<usize> = (0..=s2_chars.len()).collect();

    for (i, c1) in s1.chars().enumerate() {
        let mut current = Vec::with_capacity(previous.len());
        current.push(i + 1);
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = usize::from(c1 != *c2);
            let value = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
            current.push(value);
        }
        previous = current;
    }

    previous[s2_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_family() {
        assert!(ModelFamily::find("inception").is_some());
        assert!(ModelFamily::find("Resnet").is_some());
        assert!(ModelFamily::find("multibox").is_some());
        assert!(ModelFamily::find("yolo").is_none());
    }

    #[test]
    fn test_all_names() {
        let names = ModelFamily::all_names();
        assert_eq!(names, vec!["inception", "resnet", "multibox"]);
    }

    #[test]
    fn test_descriptors_are_valid() {
        for family in FAMILIES {
            let descriptors = family.descriptors();
            assert_eq!(descriptors.len(), family.assets.len());
            for descriptor in &descriptors {
                assert!(descriptor.validate().is_ok(), "{descriptor:?}");
                assert_eq!(descriptor.local_subfolder(), family.subfolder);
                assert!(descriptor
                    .source_url()
                    .starts_with(MODEL_BASE_URL));
            }
        }
    }

    #[test]
    fn test_asset_url_joins_host() {
        let asset = FamilyAsset {
            path: "resnet/ImageNetLabels.txt",
            sha256: None,
        };
        assert_eq!(
            asset.url(),
            "https://github.com/emgucv/models/raw/master/resnet/ImageNetLabels.txt"
        );
    }

    #[test]
    fn test_pinned_digest_flows_into_descriptor() {
        let family = ModelFamily {
            name: "pinned",
            subfolder: "Pinned",
            description: "",
            assets: &[FamilyAsset {
                path: "pinned/model.pb",
                sha256: Some(
                    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
                ),
            }],
        };
        let descriptors = family.descriptors();
        assert_eq!(
            descriptors[0].expected_checksum(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn test_suggest() {
        assert_eq!(ModelFamily::suggest("resent"), Some("resnet"));
        assert_eq!(ModelFamily::suggest("inceptoin"), Some("inception"));
        assert_eq!(ModelFamily::suggest("MultiBx"), Some("multibox"));
        assert_eq!(ModelFamily::suggest("invalid123"), None);
        assert_eq!(ModelFamily::suggest(""), None);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("resnet", "resnet"), 0);
        assert_eq!(levenshtein_distance("resnet", "resent"), 2);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }
}
