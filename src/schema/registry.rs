//! The five PawSpace resources.

use super::types::*;

pub const BLOG_CATEGORIES: &[&str] = &["care", "training", "health", "lifestyle", "apartment-tips"];
pub const PRODUCT_CATEGORIES: &[&str] = &["food", "toys", "grooming", "bedding", "training", "health"];
pub const PRODUCT_PET_TYPES: &[&str] = &["dog", "cat", "both"];
pub const ROUTINE_PET_TYPES: &[&str] = &["dog", "cat"];
pub const APARTMENT_SIZES: &[&str] = &["studio", "1bhk", "2bhk", "3bhk"];
pub const PLAN_TYPES: &[&str] = &["free", "basic", "premium"];
pub const MEMBERSHIP_STATUSES: &[&str] = &["active", "cancelled", "expired"];

const READ_WRITE: &[Operation] = &[Operation::Read, Operation::Create, Operation::Update];
const READ_WRITE_DELETE: &[Operation] = &[
    Operation::Read,
    Operation::Create,
    Operation::Update,
    Operation::Delete,
];

pub static BLOG_POSTS: ResourceSchema = ResourceSchema {
    path: "blog-posts",
    table: "blog_posts",
    label: "Blog post",
    fields: &[
        FieldSpec::text("title").required(),
        FieldSpec::text("slug")
            .required()
            .unique("A blog post with this slug already exists"),
        FieldSpec::text("excerpt"),
        FieldSpec::text("content").required(),
        FieldSpec::text("featuredImage"),
        FieldSpec::one_of("category", BLOG_CATEGORIES).required(),
        FieldSpec::text("tags"),
        FieldSpec::text("seoTitle"),
        FieldSpec::text("seoDescription"),
        FieldSpec::boolean("published", false),
        FieldSpec::timestamp("publishedAt").managed(),
        FieldSpec::timestamp("createdAt").required().managed(),
        FieldSpec::timestamp("updatedAt").required().managed(),
    ],
    operations: READ_WRITE_DELETE,
    search_fields: &["title", "excerpt", "content"],
    filters: &[
        FilterSpec {
            param: "category",
            field: "category",
            kind: FilterKind::Enum,
        },
        FilterSpec {
            param: "published",
            field: "published",
            kind: FilterKind::Bool { default: Some(true) },
        },
    ],
    order_by: "createdAt",
    created_at: "createdAt",
    updated_at: Some("updatedAt"),
    publish: Some(PublishRule {
        flag: "published",
        stamp: "publishedAt",
    }),
    lookup: Some(PathLookup::Field("slug")),
};

pub static PRODUCTS: ResourceSchema = ResourceSchema {
    path: "products",
    table: "products",
    label: "Product",
    fields: &[
        FieldSpec::text("name").required(),
        FieldSpec::text("description"),
        FieldSpec::text("price"),
        FieldSpec::text("affiliateLink").required(),
        FieldSpec::text("imageUrl"),
        FieldSpec::one_of("category", PRODUCT_CATEGORIES).required(),
        FieldSpec::one_of("petType", PRODUCT_PET_TYPES).required(),
        FieldSpec::boolean("featured", false),
        FieldSpec::new(
            "rating",
            FieldKind::Integer {
                min: Some(1),
                max: Some(5),
            },
        ),
        FieldSpec::timestamp("createdAt").required().managed(),
    ],
    operations: READ_WRITE_DELETE,
    search_fields: &["name", "description"],
    filters: &[
        FilterSpec {
            param: "category",
            field: "category",
            kind: FilterKind::Enum,
        },
        FilterSpec {
            param: "pet_type",
            field: "petType",
            kind: FilterKind::Enum,
        },
        FilterSpec {
            param: "featured",
            field: "featured",
            kind: FilterKind::Bool { default: None },
        },
    ],
    order_by: "createdAt",
    created_at: "createdAt",
    updated_at: None,
    publish: None,
    lookup: Some(PathLookup::Id),
};

pub static ROUTINES: ResourceSchema = ResourceSchema {
    path: "routines",
    table: "routines",
    label: "Routine",
    fields: &[
        FieldSpec::one_of("petType", ROUTINE_PET_TYPES).required(),
        FieldSpec::one_of("apartmentSize", APARTMENT_SIZES).required(),
        FieldSpec::text("morningRoutine"),
        FieldSpec::text("afternoonRoutine"),
        FieldSpec::text("eveningRoutine"),
        FieldSpec::text("exerciseTips"),
        FieldSpec::text("feedingSchedule"),
        FieldSpec::timestamp("createdAt").required().managed(),
    ],
    operations: READ_WRITE,
    search_fields: &[],
    filters: &[
        FilterSpec {
            param: "pet_type",
            field: "petType",
            kind: FilterKind::Enum,
        },
        FilterSpec {
            param: "apartment_size",
            field: "apartmentSize",
            kind: FilterKind::Enum,
        },
    ],
    order_by: "createdAt",
    created_at: "createdAt",
    updated_at: None,
    publish: None,
    lookup: None,
};

pub static EMAIL_LEADS: ResourceSchema = ResourceSchema {
    path: "email-leads",
    table: "email_leads",
    label: "Email lead",
    fields: &[
        FieldSpec::new("email", FieldKind::Email)
            .required()
            .unique("Email already subscribed"),
        FieldSpec::text("name"),
        FieldSpec::text("leadMagnet"),
        FieldSpec::boolean("subscribed", true),
        FieldSpec::timestamp("createdAt").required().managed(),
    ],
    operations: READ_WRITE,
    search_fields: &["email", "name"],
    filters: &[FilterSpec {
        param: "subscribed",
        field: "subscribed",
        kind: FilterKind::Bool { default: None },
    }],
    order_by: "createdAt",
    created_at: "createdAt",
    updated_at: None,
    publish: None,
    lookup: None,
};

pub static MEMBERSHIPS: ResourceSchema = ResourceSchema {
    path: "memberships",
    table: "memberships",
    label: "Membership",
    fields: &[
        FieldSpec::text("userId").required(),
        FieldSpec::one_of("planType", PLAN_TYPES).required(),
        FieldSpec::one_of("status", MEMBERSHIP_STATUSES).required(),
        FieldSpec::timestamp("startedAt").required().update_only(),
        FieldSpec::timestamp("expiresAt"),
        FieldSpec::text("stripeSubscriptionId"),
    ],
    operations: READ_WRITE,
    search_fields: &[],
    filters: &[
        FilterSpec {
            param: "user_id",
            field: "userId",
            kind: FilterKind::Exact,
        },
        FilterSpec {
            param: "plan_type",
            field: "planType",
            kind: FilterKind::Enum,
        },
        FilterSpec {
            param: "status",
            field: "status",
            kind: FilterKind::Enum,
        },
    ],
    order_by: "startedAt",
    created_at: "startedAt",
    updated_at: None,
    publish: None,
    lookup: Some(PathLookup::Latest {
        field: "userId",
        order_by: "startedAt",
    }),
};

/// Resource types served by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    BlogPost,
    Product,
    Routine,
    EmailLead,
    Membership,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::BlogPost,
        ResourceKind::Product,
        ResourceKind::Routine,
        ResourceKind::EmailLead,
        ResourceKind::Membership,
    ];

    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            ResourceKind::BlogPost => &BLOG_POSTS,
            ResourceKind::Product => &PRODUCTS,
            ResourceKind::Routine => &ROUTINES,
            ResourceKind::EmailLead => &EMAIL_LEADS,
            ResourceKind::Membership => &MEMBERSHIPS,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.schema().path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn paths_resolve_to_their_schema() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_path(kind.schema().path), Some(kind));
        }
        assert_eq!(ResourceKind::from_path("users"), None);
    }

    #[test]
    fn only_blog_posts_and_products_delete() {
        let deletable: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(|k| k.schema().allows(Operation::Delete))
            .collect();
        assert_eq!(deletable, vec![ResourceKind::BlogPost, ResourceKind::Product]);
    }

    #[test]
    fn every_referenced_field_exists() {
        for kind in ResourceKind::ALL {
            let s = kind.schema();
            let names: HashSet<_> = s.fields.iter().map(|f| f.name).collect();
            assert_eq!(names.len(), s.fields.len(), "{}: duplicate field", s.path);
            for f in s.search_fields {
                assert!(names.contains(f), "{}: search field {}", s.path, f);
            }
            for f in s.filters {
                assert!(names.contains(f.field), "{}: filter {}", s.path, f.field);
                if f.kind == FilterKind::Enum {
                    assert!(s.field(f.field).and_then(|x| x.allowed_values()).is_some());
                }
            }
            assert!(names.contains(s.order_by));
            assert!(names.contains(s.created_at));
            if let Some(u) = s.updated_at {
                assert!(names.contains(u));
            }
        }
    }

    #[test]
    fn unique_fields() {
        let slug: Vec<_> = BLOG_POSTS.unique_fields().map(|f| f.name).collect();
        assert_eq!(slug, vec!["slug"]);
        let email: Vec<_> = EMAIL_LEADS.unique_fields().map(|f| f.name).collect();
        assert_eq!(email, vec!["email"]);
        assert_eq!(MEMBERSHIPS.unique_fields().count(), 0);
    }
}
