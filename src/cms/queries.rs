//! GROQ queries
//!
//! Every content fetch goes through one of these named queries. Parameters
//! (`$slug`, `$limit`, ...) are bound by [`super::SanityClient`].

/// Post projection shared by list and detail queries (no body).
macro_rules! post_fields {
    () => {
        r#"
  _id,
  title,
  slug,
  excerpt,
  publishedAt,
  mainImage,
  aiSummary,
  rating,
  readingTime,
  author->{
    _id,
    name,
    slug,
    bio,
    image,
    role,
    socialLinks
  },
  section->{
    _id,
    title,
    slug,
    description,
    image,
    order
  },
  subcategory->{
    _id,
    title,
    slug,
    description,
    section->{
      _id,
      title,
      slug
    }
  },
  tags[]->{
    _id,
    title,
    slug,
    description
  }
"#
    };
}

/// Projection of the post fields, for callers composing their own queries
pub const POST_FIELDS: &str = post_fields!();

/// All posts, newest first
pub const ALL_POSTS_QUERY: &str = concat!(
    r#"*[_type == "post"] | order(publishedAt desc) {"#,
    post_fields!(),
    "}"
);

/// Single post by `$slug`, including its body
pub const POST_BY_SLUG_QUERY: &str = concat!(
    r#"*[_type == "post" && slug.current == $slug][0] {"#,
    post_fields!(),
    ",\n  body\n}"
);

/// Posts of the section `$sectionSlug`
pub const POSTS_BY_SECTION_QUERY: &str = concat!(
    r#"*[_type == "post" && section->slug.current == $sectionSlug] | order(publishedAt desc) {"#,
    post_fields!(),
    "}"
);

/// Posts carrying the tag `$tagSlug`
pub const POSTS_BY_TAG_QUERY: &str = concat!(
    r#"*[_type == "post" && $tagSlug in tags[]->slug.current] | order(publishedAt desc) {"#,
    post_fields!(),
    "}"
);

/// Latest `$limit` posts
pub const RECENT_POSTS_QUERY: &str = concat!(
    r#"*[_type == "post"] | order(publishedAt desc)[0...$limit] {"#,
    post_fields!(),
    "}"
);

/// Posts sharing the section `$sectionId` or any of `$tagIds`, excluding `$postId`
pub const RELATED_POSTS_QUERY: &str = concat!(
    r#"*[
  _type == "post" &&
  _id != $postId &&
  (
    section._ref == $sectionId ||
    count((tags[]->_id)[@ in $tagIds]) > 0
  )
] | order(publishedAt desc)[0...$limit] {"#,
    post_fields!(),
    "}"
);

/// Slug tuples of every post
pub const ALL_POST_SLUGS_QUERY: &str =
    r#"*[_type == "post"]{ slug, section->{ slug }, subcategory->{ slug } }"#;

/// All authors by name
pub const ALL_AUTHORS_QUERY: &str = r#"*[_type == "author"] | order(name asc) {
  _id,
  name,
  slug,
  bio,
  image,
  role,
  socialLinks
}"#;

/// Author by `$slug` with their posts
pub const AUTHOR_BY_SLUG_QUERY: &str = concat!(
    r#"*[_type == "author" && slug.current == $slug][0] {
  _id,
  name,
  slug,
  bio,
  image,
  role,
  socialLinks,
  "posts": *[_type == "post" && author->slug.current == ^.slug.current] | order(publishedAt desc) {"#,
    post_fields!(),
    "}\n}"
);

pub const ALL_AUTHOR_SLUGS_QUERY: &str = r#"*[_type == "author"]{ slug }"#;

/// All sections by display order
pub const ALL_SECTIONS_QUERY: &str = r#"*[_type == "section"] | order(order asc) {
  _id,
  title,
  slug,
  description,
  image,
  order
}"#;

/// Section by `$slug` with its direct posts (no subcategory) and subcategories
pub const SECTION_WITH_SUBCATEGORIES_QUERY: &str = concat!(
    r#"*[_type == "section" && slug.current == $slug][0] {
  _id,
  title,
  slug,
  description,
  image,
  order,
  "posts": *[
    _type == "post" &&
    section->slug.current == ^.slug.current &&
    !defined(subcategory)
  ] | order(publishedAt desc) {"#,
    post_fields!(),
    r#"},
  "subcategories": *[
    _type == "subcategory" &&
    section._ref == ^._id
  ] | order(order asc) {
    _id,
    title,
    slug,
    description,
    image,
    order,
    "postCount": count(*[_type == "post" && subcategory._ref == ^._id])
  }
}"#
);

pub const ALL_SECTION_SLUGS_QUERY: &str = r#"*[_type == "section"]{ slug }"#;

/// Subcategories of the section `$sectionSlug`, with post counts
pub const SUBCATEGORIES_BY_SECTION_QUERY: &str = r#"*[
  _type == "subcategory" &&
  section->slug.current == $sectionSlug
] | order(order asc) {
  _id,
  title,
  slug,
  description,
  image,
  order,
  section->{
    _id,
    title,
    slug
  },
  "postCount": count(*[_type == "post" && subcategory._ref == ^._id])
}"#;

/// Subcategory `$subcategorySlug` inside section `$sectionSlug`, with its posts
pub const SUBCATEGORY_BY_SLUG_QUERY: &str = concat!(
    r#"*[
  _type == "subcategory" &&
  slug.current == $subcategorySlug &&
  section->slug.current == $sectionSlug
][0] {
  _id,
  title,
  slug,
  description,
  image,
  order,
  section->{
    _id,
    title,
    slug,
    description,
    image,
    order
  },
  "posts": *[
    _type == "post" &&
    subcategory._ref == ^._id
  ] | order(publishedAt desc) {"#,
    post_fields!(),
    "}\n}"
);

pub const ALL_SUBCATEGORY_SLUGS_QUERY: &str = r#"*[_type == "subcategory"]{ slug, section->{ slug } }"#;

/// All tags by title
pub const ALL_TAGS_QUERY: &str = r#"*[_type == "tag"] | order(title asc) {
  _id,
  title,
  slug,
  description
}"#;

/// Tag by `$slug`
pub const TAG_BY_SLUG_QUERY: &str = r#"*[_type == "tag" && slug.current == $slug][0] {
  _id,
  title,
  slug,
  description
}"#;

/// Site settings singleton
pub const SITE_SETTINGS_QUERY: &str = r#"*[_type == "siteSettings"][0] {
  title,
  description,
  logo,
  socialLinks,
  navigation
}"#;
