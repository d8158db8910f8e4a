//! Dashboard navigation and catalog constants.

use serde::Serialize;

use crate::session::Role;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItem {
    pub id: u32,
    pub title: &'static str,
    pub href: &'static str,
    pub icon: &'static str,
    pub is_admin_menu: bool,
}

const SIDEBAR: &[SidebarItem] = &[
    SidebarItem {
        id: 1,
        title: "Home",
        href: "/dashboard",
        icon: "🏠",
        is_admin_menu: false,
    },
    SidebarItem {
        id: 2,
        title: "Documents",
        href: "/dashboard/documents",
        icon: "📝",
        is_admin_menu: false,
    },
    SidebarItem {
        id: 3,
        title: "User Activity",
        href: "/dashboard/user-activity",
        icon: "📊",
        is_admin_menu: true,
    },
    SidebarItem {
        id: 4,
        title: "User List",
        href: "/dashboard/users",
        icon: "👥",
        is_admin_menu: true,
    },
];

/// Sidebar entries visible to `role`. Admin entries are for admins only.
pub fn sidebar_for(role: Role) -> Vec<SidebarItem> {
    SIDEBAR
        .iter()
        .filter(|item| !item.is_admin_menu || role.is_admin())
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: &'static str,
    pub name: &'static str,
}

const fn brand(id: &'static str, name: &'static str) -> Brand {
    Brand { id, name }
}

/// Brands offered by the bike list filter. `all` disables the filter.
pub const BRANDS: &[Brand] = &[
    brand("all", "All Brands"),
    brand("honda", "Honda"),
    brand("yamaha", "Yamaha"),
    brand("suzuki", "Suzuki"),
    brand("tvs", "TVS"),
    brand("bazaz", "Bazaz"),
    brand("lifan", "Lifan"),
    brand("bajaj", "Bajaj"),
    brand("royal-enfield", "Royal Enfield"),
    brand("hero", "Hero"),
    brand("zontes", "Zontes"),
    brand("haojue", "Haojue"),
    brand("runner", "Runner"),
    brand("ktm", "KTM"),
    brand("aprilia", "Aprilia"),
    brand("kawasaki", "Kawasaki"),
    brand("benelli", "Benelli"),
    brand("keeway", "Keeway"),
    brand("taro", "Taro"),
    brand("vespa", "Vespa"),
    brand("roadmaster", "Roadmaster"),
    brand("h-power", "H Power"),
    brand("speeder", "Speeder"),
    brand("fkm", "FKM"),
    brand("gpx", "GPX"),
    brand("zenin", "Zenin"),
    brand("php", "PHP"),
    brand("cfmoto", "CFMoto"),
    brand("bmw", "BMW"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sees_everything() {
        assert_eq!(sidebar_for(Role::Admin).len(), SIDEBAR.len());
    }

    #[test]
    fn test_non_admins_lose_admin_entries() {
        for role in [Role::User, Role::Moderator] {
            let items = sidebar_for(role);
            assert!(items.iter().all(|i| !i.is_admin_menu));
            assert!(items.iter().any(|i| i.href == "/dashboard"));
        }
    }

    #[test]
    fn test_brand_ids_unique() {
        let mut ids: Vec<_> = BRANDS.iter().map(|b| b.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), BRANDS.len());
    }
}
