mod cluster_tests;
mod disk_tests;
mod node_tests;
mod storage_tests;
mod update_tests;
mod vm_tests;
