/// Display group of a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Creator,
    Series,
    Character,
    /// Any other `namespace:subtag`
    Namespaced,
    General,
}

impl TagKind {
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Creator => "Creators",
            TagKind::Series => "Series",
            TagKind::Character => "Characters",
            TagKind::Namespaced => "Namespaces",
            TagKind::General => "General",
        }
    }
}

/// A tag with its display group and the text shown for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub value: &'a str,
    pub kind: TagKind,
    pub text: &'a str,
}

impl<'a> Tag<'a> {
    /// `creator:`, `series:` and `character:` tags show only their subtag;
    /// other namespaced tags and plain tags show the full value.
    pub fn parse(value: &'a str) -> Self {
        let Some((namespace, subtag)) = value.split_once(':') else {
            return Tag { value, kind: TagKind::General, text: value };
        };
        if namespace.is_empty() || subtag.is_empty() {
            return Tag { value, kind: TagKind::General, text: value };
        }

        let kind = match namespace {
            "creator" => TagKind::Creator,
            "series" => TagKind::Series,
            "character" => TagKind::Character,
            _ => return Tag { value, kind: TagKind::Namespaced, text: value },
        };
        Tag { value, kind, text: subtag }
    }
}

/// Tags split into the viewer's sections, each keeping input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroups<'a> {
    pub creators: Vec<Tag<'a>>,
    pub series: Vec<Tag<'a>>,
    pub characters: Vec<Tag<'a>>,
    pub namespaced: Vec<Tag<'a>>,
    pub general: Vec<Tag<'a>>,
}

impl<'a> TagGroups<'a> {
    pub fn from_tags(tags: &'a [String]) -> Self {
        let mut groups = Self::default();
        for tag in tags.iter().map(|t| Tag::parse(t)) {
            match tag.kind {
                TagKind::Creator => groups.creators.push(tag),
                TagKind::Series => groups.series.push(tag),
                TagKind::Character => groups.characters.push(tag),
                TagKind::Namespaced => groups.namespaced.push(tag),
                TagKind::General => groups.general.push(tag),
            }
        }
        groups
    }

    /// Sections in display order
    pub fn sections(&self) -> [(TagKind, &[Tag<'a>]); 5] {
        [
            (TagKind::Creator, self.creators.as_slice()),
            (TagKind::Series, self.series.as_slice()),
            (TagKind::Character, self.characters.as_slice()),
            (TagKind::Namespaced, self.namespaced.as_slice()),
            (TagKind::General, self.general.as_slice()),
        ]
    }

    /// All tags in display order, flattened
    pub fn ordered(&self) -> Vec<Tag<'a>> {
        self.sections()
            .iter()
            .flat_map(|(_, tags)| tags.iter().copied())
            .collect()
    }
}
