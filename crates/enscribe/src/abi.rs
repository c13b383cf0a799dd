use alloy_sol_types::sol;

sol! {
    /// ENS Registry contract.
    contract EnsRegistry {
        function owner(bytes32 node) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
    }

    /// ENS Name Wrapper contract.
    contract NameWrapper {
        function isWrapped(bytes32 node) external view returns (bool);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
    }

    /// ENS Public Resolver contract.
    contract PublicResolver {
        function setAddr(bytes32 node, uint256 coinType, bytes a) external;
        function setName(bytes32 node, string newName) external;
    }

    /// ENS Reverse Registrar contract, also the call shape of the Base registrar.
    contract ReverseRegistrar {
        function setNameForAddr(address addr, address owner, address resolver, string name) external returns (bytes32);
    }

    /// ENSIP-19 reverse registrar deployed on rollups.
    contract L2ReverseRegistrar {
        function setNameForAddr(address addr, string name) external;
    }

    /// Naming contract that creates subnames and forward records in one call.
    contract Enscribe {
        function setNameBatch(
            address[] contractAddresses,
            string[] labels,
            string parentName,
            bytes32 parentNode,
            uint256[] coinTypes
        ) external payable returns (bool);
    }

    /// Minimal `Ownable` surface used to classify contracts.
    contract Ownable {
        function owner() external view returns (address);
    }
}
