//! Field declarations: what a metadata field is called, what it holds and
//! how it behaves.

use std::ops::BitOr;

/// Small integer identity of a metadata field.
///
/// Records key their sparse values by this id rather than by the XML key so
/// the per-frame lookups made by the UI never hash strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldId {
    Name,
    SortName,
    Desc,
    Emulator,
    Core,
    Image,
    Thumbnail,
    Video,
    Marquee,
    FanArt,
    TitleShot,
    Manual,
    Rating,
    ReleaseDate,
    Developer,
    Publisher,
    Genre,
    Family,
    ArcadeSystemName,
    Players,
    Favorite,
    Hidden,
    KidGame,
    PlayCount,
    LastPlayed,
    GameTime,
    Lang,
    Region,
    Md5,
    Crc32,
    ScraperId,
}

impl FieldId {
    pub const COUNT: usize = FieldId::ScraperId as usize + 1;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The kind of value a field holds.
///
/// The type decides how a raw value is canonicalised when it is set and
/// read back from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    MultilineString,
    /// Library-relative path, resolved against the root on demand.
    Path,
    /// Decimal text clamped to `[0, 1]`.
    Rating,
    Date,
    Timestamp,
    Boolean,
    /// `|`-separated list.
    PipeList,
    Int,
}

/// Media categories a scraper may or may not be allowed to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Thumbnail,
    Video,
    Marquee,
}

impl AssetKind {
    const fn bit(self) -> u8 {
        match self {
            AssetKind::Image => 1,
            AssetKind::Thumbnail => 1 << 1,
            AssetKind::Video => 1 << 2,
            AssetKind::Marquee => 1 << 3,
        }
    }
}

/// Set of asset categories a caller allows an import to overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetMask(u8);

impl AssetMask {
    pub const NONE: AssetMask = AssetMask(0);
    pub const IMAGE: AssetMask = AssetMask(AssetKind::Image.bit());
    pub const THUMBNAIL: AssetMask = AssetMask(AssetKind::Thumbnail.bit());
    pub const VIDEO: AssetMask = AssetMask(AssetKind::Video.bit());
    pub const MARQUEE: AssetMask = AssetMask(AssetKind::Marquee.bit());
    pub const ALL: AssetMask = AssetMask(0b1111);

    pub const fn contains(self, kind: AssetKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

impl BitOr for AssetMask {
    type Output = AssetMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        AssetMask(self.0 | rhs.0)
    }
}

/// Declaration of one metadata field.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub id: FieldId,
    /// Element name used in gamelists (e.g. "favorite", "playcount")
    pub key: &'static str,
    pub ty: FieldType,
    /// Canonical value an absent field resolves to
    pub default: &'static str,
    /// Statistics are produced by playing, never by scraping
    pub is_statistic: bool,
    /// Set for media fields so imports can honour an [`AssetMask`]
    pub asset: Option<AssetKind>,
    pub display_name: &'static str,
    /// Prompt shown by metadata editors
    pub prompt: &'static str,
}

impl FieldDecl {
    pub const fn new(
        id: FieldId,
        key: &'static str,
        ty: FieldType,
        default: &'static str,
        display_name: &'static str,
        prompt: &'static str,
    ) -> Self {
        Self {
            id,
            key,
            ty,
            default,
            is_statistic: false,
            asset: None,
            display_name,
            prompt,
        }
    }

    const fn statistic(mut self) -> Self {
        self.is_statistic = true;
        self
    }

    const fn asset(mut self, kind: AssetKind) -> Self {
        self.asset = Some(kind);
        self
    }
}

use FieldId as F;
use FieldType as T;

pub(crate) fn game_fields() -> Vec<FieldDecl> {
    vec![
        FieldDecl::new(F::Name, "name", T::String, "", "name", "enter game name"),
        FieldDecl::new(F::SortName, "sortname", T::String, "", "sortname", "enter game sort name"),
        FieldDecl::new(F::Desc, "desc", T::MultilineString, "", "description", "enter description"),
        FieldDecl::new(F::Emulator, "emulator", T::String, "", "emulator", "emulator"),
        FieldDecl::new(F::Core, "core", T::String, "", "core", "core"),
        FieldDecl::new(F::Image, "image", T::Path, "", "image", "enter path to image")
            .asset(AssetKind::Image),
        FieldDecl::new(F::Thumbnail, "thumbnail", T::Path, "", "thumbnail", "enter path to thumbnail")
            .asset(AssetKind::Thumbnail),
        FieldDecl::new(F::Video, "video", T::Path, "", "video", "enter path to video")
            .asset(AssetKind::Video),
        FieldDecl::new(F::Marquee, "marquee", T::Path, "", "marquee", "enter path to marquee")
            .asset(AssetKind::Marquee),
        FieldDecl::new(F::FanArt, "fanart", T::Path, "", "fanart", "enter path to fanart"),
        FieldDecl::new(F::TitleShot, "titleshot", T::Path, "", "titleshot", "enter path to title shot"),
        FieldDecl::new(F::Manual, "manual", T::Path, "", "manual", "enter path to manual"),
        FieldDecl::new(F::Rating, "rating", T::Rating, "0", "rating", "enter rating"),
        FieldDecl::new(F::ReleaseDate, "releasedate", T::Date, "", "release date", "enter release date"),
        FieldDecl::new(F::Developer, "developer", T::String, "", "developer", "enter game developer"),
        FieldDecl::new(F::Publisher, "publisher", T::String, "", "publisher", "enter game publisher"),
        FieldDecl::new(F::Genre, "genre", T::PipeList, "", "genre", "enter game genre"),
        FieldDecl::new(F::Family, "family", T::String, "", "game family", "enter game family"),
        FieldDecl::new(F::ArcadeSystemName, "arcadesystemname", T::String, "", "arcade system", "enter arcade system name"),
        FieldDecl::new(F::Players, "players", T::Int, "1", "players", "enter number of players"),
        FieldDecl::new(F::Favorite, "favorite", T::Boolean, "false", "favorite", "enter favorite"),
        FieldDecl::new(F::Hidden, "hidden", T::Boolean, "false", "hidden", "set hidden"),
        FieldDecl::new(F::KidGame, "kidgame", T::Boolean, "false", "kidgame", "enter kidgame"),
        FieldDecl::new(F::PlayCount, "playcount", T::Int, "0", "play count", "enter number of times played")
            .statistic(),
        FieldDecl::new(F::LastPlayed, "lastplayed", T::Timestamp, "", "last played", "enter last played date")
            .statistic(),
        FieldDecl::new(F::GameTime, "gametime", T::Int, "0", "game time", "how long the game has been played in total (seconds)")
            .statistic(),
        FieldDecl::new(F::Lang, "lang", T::PipeList, "", "languages", "enter game languages"),
        FieldDecl::new(F::Region, "region", T::String, "", "region", "enter game region"),
        FieldDecl::new(F::Md5, "md5", T::String, "", "checksum", "checksum"),
        FieldDecl::new(F::Crc32, "crc32", T::String, "", "crc32", "crc32 checksum"),
        FieldDecl::new(F::ScraperId, "scraperId", T::String, "", "scraper id", "scraper id")
            .statistic(),
    ]
}

pub(crate) fn folder_fields() -> Vec<FieldDecl> {
    vec![
        FieldDecl::new(F::Name, "name", T::String, "", "name", "enter folder name"),
        FieldDecl::new(F::Desc, "desc", T::MultilineString, "", "description", "enter description"),
        FieldDecl::new(F::Image, "image", T::Path, "", "image", "enter path to image")
            .asset(AssetKind::Image),
        FieldDecl::new(F::Thumbnail, "thumbnail", T::Path, "", "thumbnail", "enter path to thumbnail")
            .asset(AssetKind::Thumbnail),
        FieldDecl::new(F::Video, "video", T::Path, "", "video", "enter path to video")
            .asset(AssetKind::Video),
        FieldDecl::new(F::Marquee, "marquee", T::Path, "", "marquee", "enter path to marquee")
            .asset(AssetKind::Marquee),
        FieldDecl::new(F::FanArt, "fanart", T::Path, "", "fanart", "enter path to fanart"),
        FieldDecl::new(F::Rating, "rating", T::Rating, "0", "rating", "enter rating"),
        FieldDecl::new(F::ReleaseDate, "releasedate", T::Date, "", "release date", "enter release date"),
        FieldDecl::new(F::Developer, "developer", T::String, "", "developer", "enter game developer"),
        FieldDecl::new(F::Publisher, "publisher", T::String, "", "publisher", "enter game publisher"),
        FieldDecl::new(F::Genre, "genre", T::PipeList, "", "genre", "enter game genre"),
        FieldDecl::new(F::Players, "players", T::Int, "1", "players", "enter number of players"),
        FieldDecl::new(F::Favorite, "favorite", T::Boolean, "false", "favorite", "enter favorite"),
        FieldDecl::new(F::Hidden, "hidden", T::Boolean, "false", "hidden", "set hidden"),
    ]
}
