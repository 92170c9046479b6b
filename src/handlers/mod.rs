mod flavors;
mod health;
mod images;
mod instances;
mod zones;

pub use flavors::{get_flavor, list_flavors};
pub use health::{health_check, readiness_check};
pub use images::{get_image, list_images};
pub use instances::{
    create_instance, delete_instance, get_instance, instance_action, list_instances,
    update_instance,
};
pub use zones::list_zones;
