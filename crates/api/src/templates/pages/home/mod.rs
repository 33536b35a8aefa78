use maud::{html, Markup};

pub struct RouteInfo {
    pub path: &'static str,
    pub description: &'static str,
}

pub const ROUTES: &[RouteInfo] = &[
    RouteInfo {
        path: "/api/v1.0/precipitation",
        description: "Prior year rain totals by date, one value per date",
    },
    RouteInfo {
        path: "/api/v1.0/precipitation/all",
        description: "Prior year rain totals by date, every station's value",
    },
    RouteInfo {
        path: "/api/v1.0/stations",
        description: "List of station numbers",
    },
    RouteInfo {
        path: "/api/v1.0/stations/details",
        description: "List of stations with names, coordinates and elevation",
    },
    RouteInfo {
        path: "/api/v1.0/tobs",
        description: "List of prior year temperatures from all stations",
    },
    RouteInfo {
        path: "/api/v1.0/start",
        description: "When given the start date (YYYY-MM-DD), calculates the MIN/MAX/AVG temperature for all dates greater than and equal to the start date",
    },
    RouteInfo {
        path: "/api/v1.0/start/end",
        description: "When given the start and the end date (YYYY-MM-DD), calculates the MIN/MAX/AVG temperature for dates between the start and end date inclusive",
    },
    RouteInfo {
        path: "/docs",
        description: "API documentation",
    },
];

/// Route listing as a bare HTML fragment, no surrounding layout.
pub fn home_page() -> Markup {
    html! {
        "Available Routes:" br;
        @for route in ROUTES {
            br;
            (route.path) br;
            "- " (route.description) br;
        }
    }
}
